use flagbook_core::upload::MAX_IMAGE_BYTES;
use flagbook_core::{ImageStore, UploadError};

#[test]
fn saved_image_is_served_back_under_generated_name() {
    let dir = tempfile::tempdir().unwrap();
    let store = ImageStore::new(dir.path().join("uploads"));

    let name = store
        .save("Portrait.JPEG", "image/jpeg", b"\xff\xd8\xff")
        .unwrap();
    assert!(name.ends_with(".jpeg"));
    assert_ne!(name, "Portrait.JPEG");
    assert!(store.dir().join(&name).exists());

    let image = store.load(&name).unwrap();
    assert_eq!(image.filename, name);
    assert_eq!(image.content_type, "image/jpeg");
    assert_eq!(image.bytes, b"\xff\xd8\xff");
}

#[test]
fn names_without_extension_are_stored_as_png() {
    let dir = tempfile::tempdir().unwrap();
    let store = ImageStore::new(dir.path());

    let first = store.save("blob", "image/png", b"png").unwrap();
    let second = store.save("blob", "image/png", b"png").unwrap();
    assert!(first.ends_with(".png"));
    assert_ne!(first, second);
}

#[test]
fn unsupported_type_is_rejected_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let store = ImageStore::new(dir.path().join("uploads"));

    let err = store.save("notes.txt", "text/plain", b"hi").unwrap_err();
    assert!(matches!(err, UploadError::UnsupportedType(ref ty) if ty == "text/plain"));
    assert!(!store.dir().exists());
}

#[test]
fn oversized_image_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = ImageStore::new(dir.path());

    let bytes = vec![0_u8; MAX_IMAGE_BYTES + 1];
    let err = store.save("big.png", "image/png", &bytes).unwrap_err();
    assert!(matches!(
        err,
        UploadError::TooLarge { size, max } if size == MAX_IMAGE_BYTES + 1 && max == MAX_IMAGE_BYTES
    ));

    let exact = vec![0_u8; MAX_IMAGE_BYTES];
    assert!(store.save("edge.png", "image/png", &exact).is_ok());
}

#[test]
fn load_ignores_directory_components() {
    let dir = tempfile::tempdir().unwrap();
    let store = ImageStore::new(dir.path().join("uploads"));
    std::fs::write(dir.path().join("secret.png"), b"outside").unwrap();

    let name = store.save("a.png", "image/png", b"inside").unwrap();
    let image = store.load(&format!("../../{name}")).unwrap();
    assert_eq!(image.bytes, b"inside");

    let err = store.load("../secret.png").unwrap_err();
    assert!(matches!(err, UploadError::NotFound(ref name) if name == "secret.png"));
}

#[test]
fn missing_image_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = ImageStore::new(dir.path());

    assert!(matches!(
        store.load("nope.png").unwrap_err(),
        UploadError::NotFound(_)
    ));
    assert!(matches!(store.load("..").unwrap_err(), UploadError::NotFound(_)));
}

#[test]
fn removed_image_is_gone_and_outside_files_are_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let store = ImageStore::new(dir.path().join("uploads"));
    std::fs::write(dir.path().join("keep.png"), b"outside").unwrap();

    let name = store.save("a.png", "image/png", b"inside").unwrap();
    store.remove(&name).unwrap();
    assert!(matches!(store.load(&name).unwrap_err(), UploadError::NotFound(_)));

    assert!(matches!(
        store.remove("../keep.png").unwrap_err(),
        UploadError::NotFound(_)
    ));
    assert!(dir.path().join("keep.png").exists());
}
