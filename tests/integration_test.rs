use minipack::archive::{self, ArchiveError, UnpackOptions};
use minipack::{decode, encode, Entry, Malformed, MinipackError, HEADER_SIZE};
use proptest::prelude::*;
use std::fs;
use tempfile::{tempdir, NamedTempFile};

const SAMPLE: [u8; 8] = [0x02, 0xF2, 0x5D, 0x1F, 0x1C, 0x34, 0xB9, 0x2F];

/// `random.bin` + SAMPLE, byte for byte.
fn known_archive() -> Vec<u8> {
    let mut v = hex::decode("667f71e55203b5ced351aafe64aaa9ce9bc00d0e35ef7d88208f9d4a585d50a9").unwrap();
    v.push(0x0A);
    v.extend_from_slice(&[0x00, 0x00, 0x00, 0x08]);
    v.extend_from_slice(b"random.bin");
    v.extend_from_slice(&SAMPLE);
    v
}

#[test]
fn test_encode_known_layout() {
    let archive = encode(&[Entry::new("random.bin", SAMPLE.to_vec())]).unwrap();
    assert_eq!(archive.len(), HEADER_SIZE + 10 + 8);
    assert_eq!(archive, known_archive());
}

#[test]
fn test_decode_known_layout() {
    let entries = decode(&known_archive()).unwrap();
    assert_eq!(entries, vec![Entry::new("random.bin", SAMPLE.to_vec())]);
}

#[test]
fn test_multi_entry_order() {
    let entries = vec![
        Entry::new("3", b"third".to_vec()),
        Entry::new("1", b"first".to_vec()),
        Entry::new("2", b"second".to_vec()),
    ];
    let decoded = decode(&encode(&entries).unwrap()).unwrap();
    assert_eq!(decoded, entries);
}

#[test]
fn test_truncated_archive_is_rejected() {
    let archive = known_archive();
    for cut in 1..archive.len() {
        match decode(&archive[..cut]) {
            Err(MinipackError::MalformedArchive { index: 0, offset: 0, reason }) => {
                if cut < HEADER_SIZE {
                    assert_eq!(reason, Malformed::TruncatedHeader { remaining: cut });
                } else {
                    assert!(matches!(reason, Malformed::TruncatedEntry { needed: 18, .. }));
                }
            }
            other => panic!("cut at {cut}: unexpected {other:?}"),
        }
    }
}

#[test]
fn test_pack_unpack_roundtrip() {
    let src = tempdir().unwrap();
    let alpha = src.path().join("alpha.txt");
    let beta = src.path().join("beta.bin");
    fs::write(&alpha, b"Alpha file contents").unwrap();
    fs::write(&beta, [0u8, 1, 2, 3, 255]).unwrap();

    let out = NamedTempFile::new().unwrap();
    archive::pack_to_file(&[&alpha, &beta], out.path()).unwrap();

    let bytes = fs::read(out.path()).unwrap();
    let names: Vec<_> = archive::list(&bytes).unwrap().into_iter().map(|i| i.name).collect();
    assert_eq!(names, ["alpha.txt", "beta.bin"]);

    let dest = tempdir().unwrap();
    let target = dest.path().join("nested");
    let written = archive::unpack(&bytes, &target, &UnpackOptions::default()).unwrap();
    assert_eq!(written, vec![target.join("alpha.txt"), target.join("beta.bin")]);
    assert_eq!(fs::read(target.join("alpha.txt")).unwrap(), b"Alpha file contents");
    assert_eq!(fs::read(target.join("beta.bin")).unwrap(), [0u8, 1, 2, 3, 255]);
}

#[test]
fn test_unpack_refuses_overwrite() {
    let bytes = encode(&[Entry::new("a.txt", b"new".to_vec())]).unwrap();
    let dest = tempdir().unwrap();
    fs::write(dest.path().join("a.txt"), b"old").unwrap();

    let err = archive::unpack(&bytes, dest.path(), &UnpackOptions::default()).unwrap_err();
    assert!(matches!(err, ArchiveError::AlreadyExists { .. }));
    assert_eq!(fs::read(dest.path().join("a.txt")).unwrap(), b"old");

    archive::unpack(&bytes, dest.path(), &UnpackOptions { overwrite: true }).unwrap();
    assert_eq!(fs::read(dest.path().join("a.txt")).unwrap(), b"new");
}

#[test]
fn test_unpack_rejects_duplicate_names() {
    let bytes = encode(&[
        Entry::new("a.txt", b"first".to_vec()),
        Entry::new("a.txt", b"second".to_vec()),
    ])
    .unwrap();
    let dest = tempdir().unwrap();
    let target = dest.path().join("out");

    for overwrite in [false, true] {
        let err = archive::unpack(&bytes, &target, &UnpackOptions { overwrite }).unwrap_err();
        assert!(matches!(err, ArchiveError::DuplicateName { ref name } if name == "a.txt"));
    }
    assert!(!target.exists());
}

#[test]
fn test_pack_rejects_duplicate_file_names() {
    let src = tempdir().unwrap();
    let one = src.path().join("dir1");
    let two = src.path().join("dir2");
    fs::create_dir_all(&one).unwrap();
    fs::create_dir_all(&two).unwrap();
    fs::write(one.join("a.txt"), b"one").unwrap();
    fs::write(two.join("a.txt"), b"two").unwrap();

    let err = archive::pack_paths(&[one.join("a.txt"), two.join("a.txt")]).unwrap_err();
    assert!(matches!(err, ArchiveError::DuplicateName { ref name } if name == "a.txt"));
}

#[cfg(unix)]
#[test]
fn test_unpack_does_not_follow_dangling_symlink() {
    let bytes = encode(&[Entry::new("a.txt", b"payload".to_vec())]).unwrap();
    let dest = tempdir().unwrap();
    let outside = tempdir().unwrap();
    let victim = outside.path().join("victim.txt");
    std::os::unix::fs::symlink(&victim, dest.path().join("a.txt")).unwrap();

    let err = archive::unpack(&bytes, dest.path(), &UnpackOptions::default()).unwrap_err();
    assert!(matches!(err, ArchiveError::AlreadyExists { .. }));
    assert!(!victim.exists());
}

#[cfg(unix)]
#[test]
fn test_unpack_overwrite_replaces_symlink_not_its_target() {
    let bytes = encode(&[Entry::new("a.txt", b"payload".to_vec())]).unwrap();
    let dest = tempdir().unwrap();
    let outside = tempdir().unwrap();
    let victim = outside.path().join("victim.txt");
    fs::write(&victim, b"untouched").unwrap();
    let link = dest.path().join("a.txt");
    std::os::unix::fs::symlink(&victim, &link).unwrap();

    archive::unpack(&bytes, dest.path(), &UnpackOptions { overwrite: true }).unwrap();
    assert!(!fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
    assert_eq!(fs::read(&link).unwrap(), b"payload");
    assert_eq!(fs::read(&victim).unwrap(), b"untouched");
}

#[test]
fn test_unpack_rejects_path_traversal() {
    let bytes = encode(&[
        Entry::new("ok.txt", b"fine".to_vec()),
        Entry::new("../escape.txt", b"bad".to_vec()),
    ])
    .unwrap();
    let dest = tempdir().unwrap();
    let target = dest.path().join("out");

    let err = archive::unpack(&bytes, &target, &UnpackOptions::default()).unwrap_err();
    assert!(matches!(err, ArchiveError::UnsafeName { ref name } if name == "../escape.txt"));
    // Nothing is written when any entry is rejected.
    assert!(!target.exists());
}

#[test]
fn test_unpack_corrupt_archive_writes_nothing() {
    let mut bytes = known_archive();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x10;
    let dest = tempdir().unwrap();
    let target = dest.path().join("out");

    let err = archive::unpack(&bytes, &target, &UnpackOptions::default()).unwrap_err();
    assert!(matches!(err, ArchiveError::Codec(MinipackError::IntegrityError { .. })));
    assert!(!target.exists());
}

#[test]
fn test_pack_missing_file() {
    let dir = tempdir().unwrap();
    let err = archive::pack_paths(&[dir.path().join("missing")]).unwrap_err();
    assert!(matches!(err, ArchiveError::NotAFile { .. }));
}

fn entry_strategy() -> impl Strategy<Value = Entry> {
    ("\\PC{0,60}", prop::collection::vec(any::<u8>(), 0..512))
        .prop_map(|(name, body)| Entry::new(name, body))
}

proptest! {
    #[test]
    fn prop_roundtrip(entries in prop::collection::vec(entry_strategy(), 0..8)) {
        let archive = encode(&entries).unwrap();
        let expected: usize = entries.iter().map(|e| HEADER_SIZE + e.name.len() + e.body.len()).sum();
        prop_assert_eq!(archive.len(), expected);
        prop_assert_eq!(decode(&archive).unwrap(), entries);
    }

    #[test]
    fn prop_any_body_bit_flip_is_detected(
        body in prop::collection::vec(any::<u8>(), 1..256),
        pick in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let mut archive = encode(&[Entry::new("f", body.clone())]).unwrap();
        let at = HEADER_SIZE + 1 + pick.index(body.len());
        archive[at] ^= 1 << bit;
        let is_integrity_error = matches!(decode(&archive), Err(MinipackError::IntegrityError { index: 0, .. }));
        prop_assert!(is_integrity_error);
    }
}
