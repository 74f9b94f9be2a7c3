use log::LevelFilter;
use log4rs::config::Logger;
use std::{collections::BTreeMap, env, str::FromStr};
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LogError {
    #[error("logger spec parsing error: {0}")]
    ParseLoggerSpec(String),

    #[error("invalid log path: {0}")]
    InvalidPath(String),

    #[error("log appender error: {0}")]
    Appender(String),

    #[error("log configuration error: {0}")]
    Config(String),
}

/// One `target=level` directive of a filter expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) struct Directive {
    pub target: Option<String>,
    pub level: LevelFilter,
}

impl FromStr for Directive {
    type Err = LogError;

    /// Accepts `level`, `target`, `target=` and `target=level`.
    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let mut parts = spec.splitn(2, '=').map(str::trim);
        match (parts.next(), parts.next()) {
            (Some(""), _) => Err(LogError::ParseLoggerSpec(spec.to_string())),
            (Some(single), None) => match single.parse::<LevelFilter>() {
                Ok(level) => Ok(Self { target: None, level }),
                Err(_) => Ok(Self { target: Some(single.to_string()), level: LevelFilter::max() }),
            },
            (Some(target), Some("")) => Ok(Self { target: Some(target.to_string()), level: LevelFilter::max() }),
            (Some(target), Some(level)) => level
                .parse::<LevelFilter>()
                .map(|level| Self { target: Some(target.to_string()), level })
                .map_err(|_| LogError::ParseLoggerSpec(spec.to_string())),
            (None, _) => Err(LogError::ParseLoggerSpec(spec.to_string())),
        }
    }
}

pub(super) struct Loggers {
    loggers: BTreeMap<String, LevelFilter>,
    appenders: Vec<&'static str>,
    root_level: LevelFilter,
}

impl Loggers {
    pub fn root_level(&self) -> LevelFilter {
        self.root_level
    }

    pub fn items(&self) -> impl Iterator<Item = Logger> + '_ {
        self.loggers.iter().map(|(name, level)| {
            Logger::builder().appenders(self.appenders.iter().map(|x| x.to_string())).build(name.clone(), *level)
        })
    }
}

#[derive(Default)]
pub(super) struct Builder {
    appenders: Vec<&'static str>,
    loggers: BTreeMap<String, LevelFilter>,
    root_level: Option<LevelFilter>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    /// Merges the directives found in environment variable `env`, if any.
    pub fn parse_env(&mut self, env: &str) -> &mut Self {
        self.parse_expression(&env::var(env).unwrap_or_default())
    }

    /// Merges a comma separated list of directives. Invalid directives are reported and skipped.
    pub fn parse_expression(&mut self, expression: &str) -> &mut Self {
        for spec in expression.split(',').map(str::trim).filter(|x| !x.is_empty()) {
            match spec.parse::<Directive>() {
                Ok(Directive { target: Some(target), level }) => {
                    self.loggers.insert(target, level);
                }
                Ok(Directive { target: None, level }) => {
                    self.root_level = Some(level);
                }
                Err(err) => eprintln!("Ignoring invalid logging spec: {err}"),
            }
        }
        self
    }

    pub fn appenders(&mut self, appenders: impl IntoIterator<Item = &'static str>) -> &mut Self {
        self.appenders = appenders.into_iter().collect();
        self
    }

    pub fn root_level(&mut self, root_level: LevelFilter) -> &mut Self {
        self.root_level = Some(root_level);
        self
    }

    pub fn build(&mut self) -> Loggers {
        Loggers {
            loggers: std::mem::take(&mut self.loggers),
            appenders: std::mem::take(&mut self.appenders),
            root_level: self.root_level.take().unwrap_or(LevelFilter::Error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_parsing() {
        let cases = [
            ("info", Ok(Directive { target: None, level: LevelFilter::Info })),
            ("nodelink_notify", Ok(Directive { target: Some("nodelink_notify".into()), level: LevelFilter::Trace })),
            ("nodelink_notify=", Ok(Directive { target: Some("nodelink_notify".into()), level: LevelFilter::Trace })),
            ("nodelink_api=debug", Ok(Directive { target: Some("nodelink_api".into()), level: LevelFilter::Debug })),
            ("nodelink_api=loud", Err(LogError::ParseLoggerSpec("nodelink_api=loud".into()))),
            ("=debug", Err(LogError::ParseLoggerSpec("=debug".into()))),
        ];
        for (spec, expected) in cases {
            assert_eq!(spec.parse::<Directive>(), expected, "spec `{spec}`");
        }
    }

    #[test]
    fn test_builder_merges_expressions() {
        let loggers = Builder::new()
            .root_level(LevelFilter::Info)
            .parse_expression("warn, nodelink_notify=trace, bogus=nope")
            .parse_expression("nodelink_notify=debug")
            .build();
        assert_eq!(loggers.root_level(), LevelFilter::Warn);
        assert_eq!(loggers.loggers.len(), 1);
        assert_eq!(loggers.loggers.get("nodelink_notify"), Some(&LevelFilter::Debug));
    }
}
