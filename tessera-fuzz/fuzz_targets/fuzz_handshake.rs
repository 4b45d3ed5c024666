#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use tessera_zmtp::command::{parse_command, parse_ready};
use tessera_zmtp::greeting::{ZmtpGreeting, GREETING_SIZE};

fuzz_target!(|data: &[u8]| {
    if let Ok(greeting) = ZmtpGreeting::parse(data) {
        assert!(greeting.major >= 3);
        if data.len() >= GREETING_SIZE {
            // A parsed greeting re-encodes to one that parses the same way.
            let again = ZmtpGreeting::parse(&greeting.encode()).unwrap();
            assert_eq!(again.major, greeting.major);
            assert_eq!(again.as_server, greeting.as_server);
        }
    }

    let _ = parse_command(data);
    let _ = parse_ready(&Bytes::copy_from_slice(data));
});
