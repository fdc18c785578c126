//! End-to-end tests exercising the public `ReiaFile`/`ReiaEncoder` API over
//! in-memory byte buffers.

use std::io::Cursor;

use reia_codec::{container, Frame, ReiaEncoder, ReiaError, ReiaFile, Tile};

fn pack_u32_le(value: u32) -> [u8; 4] {
    value.to_le_bytes()
}

/// Enables `log`/`env_logger` output (gated by `RUST_LOG`) for tests that
/// want to observe the crate's `debug!`/`warn!`/`trace!` calls, e.g.
/// `RUST_LOG=debug cargo test -- --nocapture`. Mirrors the teacher's
/// `env_logger::init()` call at the top of its runnable entry points;
/// `try_init` tolerates being called from more than one test in this binary.
fn init_logging() {
    let _ = env_logger::try_init();
}

#[test]
fn wrong_file_magic_is_rejected() {
    init_logging();
    let bytes = b"this is not a reia file at all........".to_vec();
    let err = ReiaFile::open(Cursor::new(bytes)).unwrap_err();
    assert!(matches!(err, ReiaError::BadMagic { .. }));
}

#[test]
fn bad_inner_reiahead_magic_is_rejected() {
    let mut bytes = Vec::new();
    bytes.extend(b"RIFF");
    bytes.extend(pack_u32_le(100));
    bytes.extend(b"WAVEfmt "); // plausible-looking but wrong inner tag
    let err = ReiaFile::open(Cursor::new(bytes)).unwrap_err();
    match err {
        ReiaError::BadMagic { expected, .. } => assert_eq!(expected, b"Reiahead"),
        other => panic!("expected BadMagic, got {other:?}"),
    }
}

#[test]
fn wrong_metadata_size_is_rejected() {
    let mut bytes = Vec::new();
    bytes.extend(b"RIFF");
    bytes.extend(pack_u32_le(100));
    bytes.extend(b"Reiahead");
    bytes.extend(pack_u32_le(23)); // must be exactly 24
    let err = ReiaFile::open(Cursor::new(bytes)).unwrap_err();
    assert!(matches!(err, ReiaError::BadMetadataSize { actual: 23 }));
}

#[test]
fn known_good_empty_header_parses_with_no_frames() {
    let mut bytes = Vec::new();
    bytes.extend(b"RIFF");
    bytes.extend(pack_u32_le(20));
    bytes.extend(b"Reiahead");
    bytes.extend(pack_u32_le(24));
    bytes.extend(pack_u32_le(1));
    bytes.extend(pack_u32_le(128));
    bytes.extend(pack_u32_le(128));
    bytes.extend(pack_u32_le(10));
    bytes.extend(pack_u32_le(1));
    bytes.extend(pack_u32_le(0));

    let mut file = ReiaFile::open(Cursor::new(bytes)).unwrap();
    assert_eq!(file.width(), 128);
    assert_eq!(file.height(), 128);
    assert_eq!(file.fps(), 10.0);
    assert_eq!(file.declared_frame_count(), 0);
    assert!(file.frames().next().is_none());
}

#[test]
fn solid_color_single_frame_round_trips() {
    let mut sink = Cursor::new(Vec::new());
    let mut encoder = ReiaEncoder::new(&mut sink, 64, 64, 10.0).unwrap();
    let frame = Frame::blank(64, 64);
    encoder.write_frame(&frame).unwrap();
    encoder.finish().unwrap();

    sink.set_position(0);
    let mut file = ReiaFile::open(sink).unwrap();
    let frames: Vec<Frame> = file.into_frames_vec().unwrap();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0], frame);
}

#[test]
fn two_frame_sequence_with_one_changed_tile_round_trips() {
    let mut sink = Cursor::new(Vec::new());
    let mut encoder = ReiaEncoder::new(&mut sink, 128, 128, 24.0).unwrap();

    let first = Frame::blank(128, 128);
    let mut second = Frame::blank(128, 128);
    let changed = Tile::from_rgb_bytes(&vec![255u8; 32 * 32 * 3]);
    second.paste_tile(32, 32, &changed);

    encoder.write_frame(&first).unwrap();
    encoder.write_frame(&second).unwrap();
    encoder.finish().unwrap();

    sink.set_position(0);
    let mut file = ReiaFile::open(sink).unwrap();
    assert!((file.fps() - 24.0).abs() < 0.001);

    let frames: Vec<Frame> = file.into_frames_vec().unwrap();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0], first);
    assert_eq!(frames[1], second);
}

#[test]
fn fps_fraction_round_trips_exactly_for_non_derivable_pairs() {
    // 30000/1001 (NTSC 29.97) is not reachable via `choose_fps_fraction`'s
    // `10/1` or `1_000_000/floor(1_000_000/fps)` formula, so only the
    // explicit-fraction encoder path can reproduce it byte-exactly.
    let mut sink = Cursor::new(Vec::new());
    let mut encoder =
        ReiaEncoder::with_fps_fraction(&mut sink, 32, 32, 30_000, 1_001).unwrap();
    encoder.write_frame(&Frame::blank(32, 32)).unwrap();
    encoder.finish().unwrap();

    sink.set_position(0);
    let file = ReiaFile::open(sink).unwrap();
    assert_eq!(file.fps_fraction(), (30_000, 1_001));
}

#[test]
fn container_length_field_matches_total_written_bytes() {
    let mut sink = Cursor::new(Vec::new());
    let mut encoder = ReiaEncoder::new(&mut sink, 32, 32, 10.0).unwrap();
    encoder.write_frame(&Frame::blank(32, 32)).unwrap();
    let sink = encoder.finish().unwrap();

    let bytes = sink.into_inner();
    let declared_len = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
    assert_eq!(declared_len as usize, bytes.len() - 8);
}

#[test]
fn encoder_patches_num_frames_to_actual_count_written() {
    let mut sink = Cursor::new(Vec::new());
    let mut encoder = ReiaEncoder::new(&mut sink, 32, 32, 10.0).unwrap();
    encoder.write_frame(&Frame::blank(32, 32)).unwrap();
    encoder.write_frame(&Frame::blank(32, 32)).unwrap();
    encoder.write_frame(&Frame::blank(32, 32)).unwrap();
    encoder.finish().unwrap();

    sink.set_position(0);
    let mut file = ReiaFile::open(sink).unwrap();
    assert_eq!(file.declared_frame_count(), 3);
    let frames: Vec<Frame> = file.into_frames_vec().unwrap();
    assert_eq!(frames.len(), 3);
}

#[test]
fn frame_count_mismatch_is_reported_without_failing_decode() {
    let mut bytes = Cursor::new(Vec::new());
    container::write_header(&mut bytes, 32, 32, 10.0, 3).unwrap();
    container::write_frame(&mut bytes, &Frame::blank(32, 32), None).unwrap();
    bytes.set_position(0);

    let mut file = ReiaFile::open(bytes).unwrap();
    assert_eq!(file.declared_frame_count(), 3);
    let mut iter = file.frames();
    assert!(iter.next().unwrap().is_ok());
    assert!(iter.next().is_none());
    let mismatch = iter.count_mismatch().expect("declared count of 3 should not match 1 decoded frame");
    assert_eq!(mismatch.declared, 3);
    assert_eq!(mismatch.actual, 1);
}

#[test]
fn orphan_reuse_marker_in_first_frame_is_a_hard_error() {
    let mut bytes = Cursor::new(Vec::new());
    container::write_header(&mut bytes, 32, 32, 10.0, 1).unwrap();
    bytes.get_mut().extend(b"frme");
    bytes.get_mut().extend(1u32.to_le_bytes());
    bytes.get_mut().push(0x00); // reuse marker with no previous frame
    bytes.set_position(0);

    let mut file = ReiaFile::open(bytes).unwrap();
    let err = file.frames().next().unwrap().unwrap_err();
    assert!(matches!(err, ReiaError::OrphanReuse { x: 0, y: 0 }));
}
