//! End-to-end scenarios from §8, driven through the public `Handle` API
//! rather than internal module state -- this is what actually wires C1
//! through C8 together.

use std::net::IpAddr;
use std::sync::Arc;

use knet_core::{
    AclAction, AclEntry, Handle, HandleConfig, HostId, LinkConfig, NullLogger, TransportKind,
};
use knet_crypto_abi::CryptoConfig;

fn handle() -> Handle {
    Handle::new(HandleConfig {
        node_id: 42,
        handle_id: 1,
        logger: Arc::new(NullLogger),
    })
}

fn nss_zero_key() -> CryptoConfig {
    CryptoConfig {
        crypto_model: "nss".into(),
        crypto_cipher_type: "aes256".into(),
        crypto_hash_type: "sha256".into(),
        private_key: vec![0u8; knet_crypto_abi::MAX_KEY_LEN.min(32)],
    }
}

#[test]
fn scenario_1_install_and_round_trip() {
    let h = handle();
    h.handle_crypto_set_config(&nss_zero_key(), 1).unwrap();
    h.handle_crypto_use_config(1).unwrap();

    let ct = h.send(b"Hello world!").unwrap();
    let out = h.recv(&ct).unwrap();
    assert_eq!(out.plaintext, b"Hello world!");
    assert_eq!(out.slot, 1);
}

#[test]
fn scenario_2_and_3_rekey_without_dropping_packets() {
    let h = handle();
    let mut key_one = nss_zero_key();
    key_one.private_key = b"slot-one-key-slot-one-key-12345".to_vec();
    h.handle_crypto_set_config(&key_one, 1).unwrap();
    h.handle_crypto_use_config(1).unwrap();

    let packet_from_slot_one = h.send(b"packet under slot 1").unwrap();

    let mut key_two = nss_zero_key();
    key_two.private_key = b"slot-two-key-slot-two-key-67890".to_vec();
    h.handle_crypto_set_config(&key_two, 2).unwrap();

    // Scenario 2: peer still sending under slot 1 while we have staged slot 2.
    let out = h.recv(&packet_from_slot_one).unwrap();
    assert_eq!(out.plaintext, b"packet under slot 1");
    assert_eq!(out.slot, 1);

    // Scenario 3: cut sending over to slot 2; peer (slot 1) still decrypts
    // as an alternate.
    h.handle_crypto_use_config(2).unwrap();
    let packet_from_slot_two = h.send(b"packet under slot 2").unwrap();
    assert!(h.recv(&packet_from_slot_two).is_ok());

    let still_slot_one = h.recv(&packet_from_slot_one).unwrap();
    assert_eq!(still_slot_one.slot, 1);
}

#[test]
fn scenario_4_teardown_leaves_only_remaining_slot_error() {
    let h = handle();
    let mut key_one = nss_zero_key();
    key_one.private_key = b"slot-one-key-slot-one-key-12345".to_vec();
    h.handle_crypto_set_config(&key_one, 1).unwrap();
    h.handle_crypto_use_config(1).unwrap();
    let packet_from_slot_one = h.send(b"payload").unwrap();

    let mut key_two = nss_zero_key();
    key_two.private_key = b"slot-two-key-slot-two-key-67890".to_vec();
    h.handle_crypto_set_config(&key_two, 2).unwrap();
    h.handle_crypto_use_config(2).unwrap();

    h.handle_crypto_fini(1).unwrap();

    assert!(h.recv(&packet_from_slot_one).is_err());
}

#[test]
fn scenario_5_address_and_range_acl() {
    let h = handle();
    let sock = 1;
    h.check_add(
        sock,
        TransportKind::Udp,
        AclEntry::address("10.0.0.1".parse().unwrap(), AclAction::Accept),
    );
    h.check_add(
        sock,
        TransportKind::Udp,
        AclEntry::range(
            "10.0.0.0".parse().unwrap(),
            "10.0.0.255".parse().unwrap(),
            AclAction::Reject,
        ),
    );

    let check = |addr: &str| -> AclAction {
        h.check_validate(sock, TransportKind::Udp, addr.parse::<IpAddr>().unwrap())
    };
    assert_eq!(check("10.0.0.1"), AclAction::Accept);
    assert_eq!(check("10.0.0.2"), AclAction::Reject);
    assert_eq!(check("192.168.0.1"), AclAction::Reject);
}

#[test]
fn scenario_6_mask_with_implicit_reject_all() {
    let h = handle();
    let sock = 2;
    h.check_add(
        sock,
        TransportKind::Sctp,
        AclEntry::mask(
            "10.0.0.0".parse().unwrap(),
            "255.255.255.0".parse().unwrap(),
            AclAction::Accept,
        ),
    );

    let check = |addr: &str| -> AclAction {
        h.check_validate(sock, TransportKind::Sctp, addr.parse::<IpAddr>().unwrap())
    };
    assert_eq!(check("10.0.0.99"), AclAction::Accept);
    assert_eq!(check("10.0.1.1"), AclAction::Reject);
}

#[test]
fn boundary_unknown_model_leaves_handle_unchanged() {
    use knet_core::ErrnoClass;
    let h = handle();
    let mut bad = nss_zero_key();
    bad.crypto_model = "wolfssl".into();
    let err = h.handle_crypto_set_config(&bad, 1).unwrap_err();
    assert_eq!(err.class(), ErrnoClass::NotSupported);
    assert_eq!(h.crypto_derived_sizes().sec_block_size, 0);
}

#[test]
fn boundary_use_config_on_empty_slot_is_invalid() {
    let h = handle();
    assert!(h.handle_crypto_use_config(4).is_err());
}

#[test]
fn boundary_recv_with_no_instances_is_a_precondition_error() {
    let h = handle();
    assert!(h.recv(b"anything").is_err());
}

#[test]
fn link_and_host_lifecycle_reaches_connected_and_updates_reachability() {
    let h = handle();
    let host_id: HostId = 9;
    h.host_add(knet_core::Host::new(host_id, "peer-b", true, false));
    h.link_set_config(
        host_id,
        0,
        LinkConfig {
            transport: TransportKind::Udp,
            src: "127.0.0.1:7000".parse().unwrap(),
            dst: "127.0.0.1:7001".parse().unwrap(),
            timeout_interval: std::time::Duration::from_secs(5),
            ping_interval: std::time::Duration::from_secs(1),
            precision_window: 8,
        },
    )
    .unwrap();

    assert!(!h.host_get_status(host_id).unwrap().reachable);
    h.link_set_enable(host_id, 0, true).unwrap();
    assert!(!h.host_get_status(host_id).unwrap().reachable); // PROBING, not yet connected
}

#[test]
fn encrypted_payload_round_trips_over_the_fake_transport() {
    use knet_core::{Transport, TransportEvent};
    use knet_harness::InMemoryNetwork;

    let net = InMemoryNetwork::new();
    let a = net.bind("127.0.0.1:8000".parse().unwrap());
    let b = net.bind("127.0.0.1:8001".parse().unwrap());

    let sender = handle();
    sender.handle_crypto_set_config(&nss_zero_key(), 1).unwrap();
    sender.handle_crypto_use_config(1).unwrap();
    let receiver = handle();
    receiver.handle_crypto_set_config(&nss_zero_key(), 1).unwrap();
    receiver.handle_crypto_use_config(1).unwrap();

    let ciphertext = sender.send(b"mesh payload").unwrap();
    a.send_to("127.0.0.1:8001".parse().unwrap(), &ciphertext)
        .unwrap();

    match b.recv_from().unwrap() {
        TransportEvent::Data { bytes, .. } => {
            let out = receiver.recv(&bytes).unwrap();
            assert_eq!(out.plaintext, b"mesh payload");
        }
        TransportEvent::WouldBlock => panic!("expected the datagram sent above"),
    }
}
