#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use tessera_core::buffer::SegmentedBuffer;
use tessera_zmtp::codec::{encode_multipart, ZmtpDecoder};
use tessera_zmtp::multipart::MultipartBuffer;

fuzz_target!(|data: &[u8]| {
    // Split the input at a data-dependent point so fragmented reads are
    // exercised as well as whole buffers.
    let split = data.first().map_or(0, |b| usize::from(*b)).min(data.len());
    let (head, tail) = data.split_at(split);

    let mut decoder = ZmtpDecoder::with_max_frame_size(Some(1 << 20));
    let mut assembler = MultipartBuffer::new(64, Some(1 << 20));
    let mut buf = SegmentedBuffer::new();

    for chunk in [head, tail] {
        buf.push(Bytes::copy_from_slice(chunk));
        loop {
            match decoder.decode(&mut buf) {
                Ok(Some(frame)) => {
                    assert!(frame.payload.len() <= 1 << 20);
                    if let Ok(Some(msg)) = assembler.push_frame(frame) {
                        // Whatever decodes must re-encode to a decodable stream.
                        let mut wire = Vec::new();
                        encode_multipart(&msg, &mut wire);
                        let mut again = SegmentedBuffer::new();
                        again.push(Bytes::from(wire));
                        let mut check = ZmtpDecoder::new();
                        for frame in &msg {
                            let decoded = check.decode(&mut again).unwrap().unwrap();
                            assert_eq!(&decoded.payload, frame);
                        }
                    }
                }
                Ok(None) => break,
                Err(_) => return,
            }
        }
    }
});
