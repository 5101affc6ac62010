use lopdf::{Dictionary, Document, Object, Stream};
use pdf_async_runtime::*;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

fn create_test_pdf(num_pages: usize, width: i64, height: i64) -> Document {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for _ in 0..num_pages {
        let content_id = doc.add_object(Stream::new(Dictionary::new(), b"q Q".to_vec()));
        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(width),
                    Object::Integer(height),
                ]),
            ),
            ("Resources", Object::Dictionary(Dictionary::new())),
            ("Contents", Object::Reference(content_id)),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(num_pages as i64)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", catalog_id);

    doc
}

fn write_fixture(dir: &Path) -> PathBuf {
    // A1 sheet, portrait
    let path = dir.join("drawing.pdf");
    let mut doc = create_test_pdf(2, 1684, 2384);
    doc.save(&path).unwrap();
    path
}

async fn next_update(session: &mut SessionHandle) -> TileUpdate {
    tokio::time::timeout(Duration::from_secs(10), session.recv())
        .await
        .expect("timed out waiting for update")
        .expect("session closed unexpectedly")
}

/// Skip updates until the next mask list arrives
async fn next_masks(session: &mut SessionHandle) -> (Vec<Mask>, Option<MaskId>) {
    loop {
        match next_update(session).await {
            TileUpdate::MasksChanged { masks, selected } => return (masks, selected),
            TileUpdate::Error { message } => panic!("Unexpected error: {message}"),
            _ => continue,
        }
    }
}

async fn loaded_session(dir: &Path) -> SessionHandle {
    let mut session = spawn_session();
    session
        .send(TileCommand::Load {
            path: write_fixture(dir),
        })
        .unwrap();

    match next_update(&mut session).await {
        TileUpdate::Loaded {
            page_count,
            page_index,
            format,
            ..
        } => {
            assert_eq!(page_count, 2);
            assert_eq!(page_index, 0);
            assert_eq!(format, Some("A1"));
        }
        other => panic!("Expected Loaded, got {other:?}"),
    }
    let (masks, _) = next_masks(&mut session).await;
    assert!(masks.is_empty());
    session
}

#[tokio::test]
async fn test_generate_before_load_is_error() {
    let mut session = spawn_session();
    session
        .send(TileCommand::Generate {
            config: TilingConfig::default(),
        })
        .unwrap();

    match next_update(&mut session).await {
        TileUpdate::Error { message } => assert!(message.contains("No document")),
        other => panic!("Expected Error, got {other:?}"),
    }
    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_load_missing_file_reports_error() {
    let mut session = spawn_session();
    session
        .send(TileCommand::Load {
            path: PathBuf::from("/nonexistent/plan.pdf"),
        })
        .unwrap();

    match next_update(&mut session).await {
        TileUpdate::Error { message } => assert!(message.contains("plan.pdf")),
        other => panic!("Expected Error, got {other:?}"),
    }
    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_generate_and_edit_masks() {
    let temp = TempDir::new().unwrap();
    let mut session = loaded_session(temp.path()).await;

    session
        .send(TileCommand::Generate {
            config: TilingConfig::new(15.0, "A3", false),
        })
        .unwrap();
    let (masks, selected) = next_masks(&mut session).await;
    assert!(masks.len() > 1);
    assert_eq!(selected, None);

    let first = masks[0].clone();
    session.send(TileCommand::Select { id: first.id }).unwrap();
    let (_, selected) = next_masks(&mut session).await;
    assert_eq!(selected, Some(first.id));

    session.send(TileCommand::RotateSelected).unwrap();
    let (rotated, _) = next_masks(&mut session).await;
    assert_eq!(rotated[0].id, first.id);
    assert!(rotated[0].landscape);
    assert!((rotated[0].rect.width - first.rect.height).abs() < 1e-9);

    session.send(TileCommand::RemoveSelected).unwrap();
    let (remaining, selected) = next_masks(&mut session).await;
    assert_eq!(remaining.len(), masks.len() - 1);
    assert_eq!(selected, None);
    assert!(remaining.iter().all(|m| m.id != first.id));

    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_add_and_move_manual_mask() {
    let temp = TempDir::new().unwrap();
    let mut session = loaded_session(temp.path()).await;

    session
        .send(TileCommand::AddMask {
            format: "A4".to_string(),
            landscape: false,
            placement: Placement::At(Point::new(100.0, 100.0)),
        })
        .unwrap();
    let (masks, _) = next_masks(&mut session).await;
    assert_eq!(masks.len(), 1);
    assert!(masks[0].grid.is_none());

    session
        .send(TileCommand::MoveMask {
            id: masks[0].id,
            dx: -500.0,
            dy: 20.0,
        })
        .unwrap();
    let (moved, _) = next_masks(&mut session).await;
    assert_eq!(moved[0].rect.x, 0.0);
    assert_eq!(moved[0].rect.y, 120.0);

    session
        .send(TileCommand::AddMask {
            format: "Tabloid".to_string(),
            landscape: false,
            placement: Placement::At(Point::new(0.0, 0.0)),
        })
        .unwrap();
    match next_update(&mut session).await {
        TileUpdate::Error { message } => assert!(message.contains("Tabloid")),
        other => panic!("Expected Error, got {other:?}"),
    }

    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_latest_generate_wins() {
    let temp = TempDir::new().unwrap();
    let mut session = loaded_session(temp.path()).await;

    for format in ["A4", "A2", "A3"] {
        session
            .send(TileCommand::Generate {
                config: TilingConfig::new(15.0, format, false),
            })
            .unwrap();
    }
    // Out-of-range page marks the end of the burst
    session
        .send(TileCommand::SelectPage { page_index: 99 })
        .unwrap();

    let mut last = None;
    loop {
        match next_update(&mut session).await {
            TileUpdate::MasksChanged { masks, .. } => last = Some(masks),
            TileUpdate::Error { .. } => break,
            _ => {}
        }
    }

    let masks = last.unwrap();
    let (w, h) = pdf_tile::format_size("A3");
    assert!((masks[0].rect.width - w).abs() < 1e-9);
    assert!((masks[0].rect.height - h).abs() < 1e-9);

    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_select_page_clears_masks() {
    let temp = TempDir::new().unwrap();
    let mut session = loaded_session(temp.path()).await;

    session
        .send(TileCommand::Generate {
            config: TilingConfig::default(),
        })
        .unwrap();
    let (masks, _) = next_masks(&mut session).await;
    assert!(!masks.is_empty());

    session
        .send(TileCommand::SelectPage { page_index: 1 })
        .unwrap();
    match next_update(&mut session).await {
        TileUpdate::PageSelected { page_index, .. } => assert_eq!(page_index, 1),
        other => panic!("Expected PageSelected, got {other:?}"),
    }
    let (masks, _) = next_masks(&mut session).await;
    assert!(masks.is_empty());

    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_export_reports_progress_and_completion() {
    let temp = TempDir::new().unwrap();
    let mut session = loaded_session(temp.path()).await;

    session
        .send(TileCommand::Generate {
            config: TilingConfig::new(15.0, "A2", false),
        })
        .unwrap();
    let (masks, _) = next_masks(&mut session).await;

    let out = temp.path().join("tiles");
    session
        .send(TileCommand::Export {
            output_dir: out.clone(),
            options: ExportOptions::default(),
        })
        .unwrap();

    let mut progress = 0;
    let report = loop {
        match next_update(&mut session).await {
            TileUpdate::Progress { current, total, .. } => {
                assert_eq!(total, masks.len());
                progress = current;
            }
            TileUpdate::ExportComplete { report } => break report,
            other => panic!("Unexpected update {other:?}"),
        }
    };

    assert_eq!(progress, masks.len());
    assert!(report.is_complete());
    assert_eq!(report.written.len(), masks.len());
    assert!(out.join("drawing_part_001.pdf").exists());

    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_close_stops_worker() {
    let mut session = spawn_session();
    session.send(TileCommand::Close).unwrap();

    assert!(matches!(next_update(&mut session).await, TileUpdate::Closed));
    let after = tokio::time::timeout(Duration::from_secs(10), session.recv())
        .await
        .unwrap();
    assert!(after.is_none());

    session.shutdown().await.unwrap();
}

/// Wait for the export result, ignoring progress
async fn next_report(session: &mut SessionHandle) -> ExportReport {
    loop {
        match next_update(session).await {
            TileUpdate::ExportComplete { report } => return report,
            TileUpdate::Progress { .. } => continue,
            other => panic!("Unexpected update {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_cancel_queued_export() {
    let temp = TempDir::new().unwrap();
    let mut session = loaded_session(temp.path()).await;

    session
        .send(TileCommand::Generate {
            config: TilingConfig::new(15.0, "A2", false),
        })
        .unwrap();
    let (masks, _) = next_masks(&mut session).await;
    assert!(!masks.is_empty());

    // Cancelled before the worker picks the export up
    let out = temp.path().join("cancelled");
    session
        .send(TileCommand::Export {
            output_dir: out.clone(),
            options: ExportOptions::default(),
        })
        .unwrap();
    session.cancel_export();

    let report = next_report(&mut session).await;
    assert!(report.written.is_empty());
    assert_eq!(report.skipped, masks.len());
    assert!(!out.join("drawing_part_001.pdf").exists());

    // The next export gets a fresh token
    session
        .send(TileCommand::Export {
            output_dir: temp.path().join("retry"),
            options: ExportOptions::default(),
        })
        .unwrap();
    let report = next_report(&mut session).await;
    assert!(report.is_complete());
    assert_eq!(report.written.len(), masks.len());

    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_cancel_without_export_does_not_affect_next() {
    let temp = TempDir::new().unwrap();
    let mut session = loaded_session(temp.path()).await;

    session
        .send(TileCommand::Generate {
            config: TilingConfig::new(15.0, "A2", false),
        })
        .unwrap();
    let (masks, _) = next_masks(&mut session).await;

    session.cancel_export();
    session
        .send(TileCommand::Export {
            output_dir: temp.path().join("out"),
            options: ExportOptions::default(),
        })
        .unwrap();

    let report = next_report(&mut session).await;
    assert_eq!(report.written.len(), masks.len());

    session.shutdown().await.unwrap();
}
