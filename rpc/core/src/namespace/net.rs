namespace!(Net, "net");

impl Net {
    route!(listening, "net_listening");
    route!(peer_count, "net_peerCount");
    route!(version, "net_version");
}
