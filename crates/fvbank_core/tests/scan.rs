//! End-to-end scans over file-backed template streams.

use fvbank_core::{
    scan_buffer, CoreError, ImageId, Roi, ScanOptions, Template, TemplateBuilder, TemplateFile,
    HEADER_SIZE,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tempfile::tempdir;

fn enrolled(i: u32) -> Template {
    TemplateBuilder::new(ImageId::from_bytes([(i % 256) as u8; 16]), i as i32)
        .roi(Roi::new(i, i, 128, 128))
        .label(i)
        .url("gallery/subject.png")
        .feature_vector(&vec![(i % 256) as u8; (i % 48) as usize])
        .build()
        .unwrap()
}

#[test]
fn sequential_file_scan_preserves_order_and_fields() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gallery.fv");

    let originals: Vec<Template> = (0..25).map(enrolled).collect();
    {
        let file = TemplateFile::open(&path).unwrap();
        for t in &originals {
            file.append(t).unwrap();
        }
        file.sync().unwrap();
    }

    let file = TemplateFile::open(&path).unwrap();
    let mut seen = Vec::new();
    let count = file
        .scan(|_, view| seen.push(view.to_template()))
        .unwrap();

    assert_eq!(count, 25);
    assert_eq!(seen, originals);
}

#[test]
fn parallel_file_scan_delivers_exactly_once() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gallery.fv");

    let file = TemplateFile::open(&path).unwrap();
    for i in 0..40 {
        file.append(&enrolled(i)).unwrap();
    }

    let labels = Mutex::new(Vec::new());
    let count = file
        .scan_parallel(&ScanOptions::new().workers(4), |_, view| {
            labels.lock().push(view.label());
        })
        .unwrap();

    assert_eq!(count, 40);
    let mut labels = labels.into_inner();
    labels.sort_unstable();
    assert_eq!(labels, (0..40).collect::<Vec<_>>());
}

#[test]
fn truncated_file_fails_both_scan_modes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gallery.fv");

    {
        let file = TemplateFile::open(&path).unwrap();
        file.append(&enrolled(1)).unwrap();
        file.append(&enrolled(2)).unwrap();
        file.sync().unwrap();
    }

    // tear the final payload byte off, as a crashed writer would
    let len = std::fs::metadata(&path).unwrap().len();
    let f = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
    f.set_len(len - 1).unwrap();

    let file = TemplateFile::open(&path).unwrap();

    let mut delivered = 0u64;
    let err = file.scan(|_, _| delivered += 1).unwrap_err();
    assert!(matches!(err, CoreError::Corruption { .. }));
    assert_eq!(delivered, 1);

    let invocations = AtomicU64::new(0);
    let err = file
        .scan_parallel(&ScanOptions::default(), |_, _| {
            invocations.fetch_add(1, Ordering::Relaxed);
        })
        .unwrap_err();
    assert!(matches!(err, CoreError::Corruption { .. }));
    assert_eq!(invocations.load(Ordering::Relaxed), 0);
}

#[test]
fn on_disk_image_matches_buffer_scan() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gallery.fv");

    let originals: Vec<Template> = (0..8).map(enrolled).collect();
    {
        let file = TemplateFile::open(&path).unwrap();
        for t in &originals {
            file.append(t).unwrap();
        }
        file.sync().unwrap();
    }

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(
        bytes.len(),
        originals.iter().map(Template::total_size).sum::<usize>()
    );

    let mut seen = Vec::new();
    let count = scan_buffer(&bytes, |_, view| seen.push(view.to_template())).unwrap();
    assert_eq!(count, 8);
    assert_eq!(seen, originals);
}

#[test]
fn known_record_byte_layout_on_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("single.fv");

    let template = TemplateBuilder::new(ImageId::ZERO, 1)
        .roi(Roi::new(0, 0, 100, 100))
        .label(7)
        .url("foo.jpg")
        .feature_vector(&[0x01, 0x02, 0x03])
        .build()
        .unwrap();

    {
        let file = TemplateFile::open(&path).unwrap();
        file.append(&template).unwrap();
        file.sync().unwrap();
    }

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), HEADER_SIZE + 11);
    assert_eq!(&bytes[..16], &[0u8; 16]);
    assert_eq!(&bytes[40..44], &8u32.to_le_bytes());
    assert_eq!(&bytes[44..48], &3u32.to_le_bytes());
    assert_eq!(&bytes[48..56], b"foo.jpg\0");
    assert_eq!(&bytes[56..], &[0x01, 0x02, 0x03]);
}

#[test]
fn rescans_of_unmodified_file_are_identical() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gallery.fv");

    let file = TemplateFile::open(&path).unwrap();
    for i in 0..12 {
        file.append(&enrolled(i)).unwrap();
    }

    let pass = || {
        let mut out = Vec::new();
        file.scan(|offset, view| out.push((offset, view.to_template())))
            .unwrap();
        out
    };

    assert_eq!(pass(), pass());
}
