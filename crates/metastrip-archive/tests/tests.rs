use std::io::{Cursor, Read, Write};
use std::path::Path;

use metastrip_archive::{
    Error, ExtractOptions, IntakePolicy, assemble_archive, extract_archive, validate_upload,
};
use zip::write::SimpleFileOptions;

fn zip_of(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in files {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn names_in(bytes: Vec<u8>) -> Vec<String> {
    let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    archive.file_names().map(str::to_string).collect()
}

fn upload_round_trip(bytes: &[u8], workdir: &Path) -> Result<Vec<u8>, Error> {
    validate_upload(bytes, &IntakePolicy::default())?;

    let zip_path = workdir.join("upload.zip");
    std::fs::write(&zip_path, bytes).unwrap();
    let images = workdir.join("images");
    std::fs::create_dir(&images).unwrap();

    extract_archive(&zip_path, &images, &ExtractOptions::default())?;
    assemble_archive(&images)
}

#[test]
fn n_images_survive_validate_extract_assemble() {
    for n in [1usize, 3, 7] {
        let names: Vec<String> = (0..n).map(|i| format!("img_{i}.jpg")).collect();
        let files: Vec<(&str, &[u8])> = names.iter().map(|n| (n.as_str(), &b"data"[..])).collect();
        let bytes = zip_of(&files);

        let dir = tempfile::Builder::new()
            .prefix("metastrip-test-zip-")
            .tempdir()
            .unwrap();
        let result = upload_round_trip(&bytes, dir.path()).unwrap();

        let mut got = names_in(result);
        got.sort();
        let mut want = names.clone();
        want.sort();
        assert_eq!(got, want, "n = {n}");
    }
}

#[test]
fn traversal_names_land_inside_destination() {
    let bytes = zip_of(&[("../../../outside.jpg", b"x"), ("..\\win.png", b"y")]);
    let dir = tempfile::tempdir().unwrap();
    let result = upload_round_trip(&bytes, dir.path()).unwrap();

    let mut got = names_in(result);
    got.sort();
    assert_eq!(got, vec!["outside.jpg", "win.png"]);
    assert!(!dir.path().parent().unwrap().join("outside.jpg").exists());
}

#[test]
fn text_member_never_reaches_disk() {
    let bytes = zip_of(&[("test_file.txt", b"hello")]);
    let dir = tempfile::tempdir().unwrap();
    let err = upload_round_trip(&bytes, dir.path()).unwrap_err();
    assert!(matches!(err, Error::DisallowedMember { .. }));
    assert!(!dir.path().join("upload.zip").exists());
}

#[test]
fn empty_upload_fails_at_extraction() {
    let bytes = zip_of(&[]);
    let dir = tempfile::tempdir().unwrap();
    let err = upload_round_trip(&bytes, dir.path()).unwrap_err();
    assert!(matches!(err, Error::EmptyArchive));
}

#[test]
fn assembled_content_matches_uploaded_content() {
    let bytes = zip_of(&[("a.png", b"first"), ("b.jpeg", b"second")]);
    let dir = tempfile::tempdir().unwrap();
    let result = upload_round_trip(&bytes, dir.path()).unwrap();

    let mut archive = zip::ZipArchive::new(Cursor::new(result)).unwrap();
    let mut content = String::new();
    archive
        .by_name("b.jpeg")
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();
    assert_eq!(content, "second");
}
