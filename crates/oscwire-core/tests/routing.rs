use oscwire_core::{Message, match_pattern};

#[test]
fn documented_match_cases() {
    assert!(match_pattern("/foo/bar", "/foo/bar").is_full());
    assert!(match_pattern("/foo/*", "/foo/bar").is_full());

    let prefix = match_pattern("/foo/*", "/foo/bar/baz");
    assert!(!prefix.is_full());
    assert_eq!(prefix.route_offset("/foo/bar/baz"), Some(8));

    assert!(match_pattern("/foo/[a-c]", "/foo/b").is_full());
    assert!(!match_pattern("/foo/[!a-c]", "/foo/b").is_full());
    assert!(match_pattern("/foo/{bar,baz}", "/foo/baz").is_full());
    assert!(!match_pattern("/foo/{bar,baz}", "/foo/qux").is_full());
}

#[test]
fn nested_routing_consumes_the_address_in_steps() {
    let msg = Message::new("/mixer/ch/12/eq/gain");
    let mut reached = Vec::new();

    let routed = msg.route(
        "/mixer",
        &mut |m: &Message, offset: usize| {
            m.route(
                "/ch/[0-9]*",
                &mut |m: &Message, offset: usize| {
                    m.dispatch(
                        "/eq/gain",
                        &mut |m: &Message| reached.push(m.address().map(str::to_owned)),
                        offset,
                    );
                },
                offset,
            );
        },
        0,
    );

    assert!(routed);
    assert_eq!(reached, [Some("/mixer/ch/12/eq/gain".to_string())]);
}

#[test]
fn handlers_can_be_plain_structs() {
    struct Counter(usize);

    impl oscwire_core::Dispatch for Counter {
        fn dispatch(&mut self, _: &Message) {
            self.0 += 1;
        }
    }

    let mut counter = Counter(0);
    for address in ["/a/1", "/a/2", "/b/1"] {
        Message::new(address).dispatch("/a/?", &mut counter, 0);
    }
    assert_eq!(counter.0, 2);
}

#[test]
fn decoded_message_dispatches() {
    let mut tx = Message::new("/light/7/level");
    tx.add(0.5f32);
    let mut rx = Message::default();
    rx.fill_slice(&tx.to_bytes());

    let mut level = None;
    rx.dispatch("/light/*/level", &mut |m: &Message| level = m.get_float(0), 0);
    assert_eq!(level, Some(0.5));
}
