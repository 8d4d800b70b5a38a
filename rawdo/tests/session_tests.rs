#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};
    use rawdo::librawdo::{Companding, ConversionParams, HistoryStore, MemoryBackend};
    use rawdo::picture::read_image_file;
    use rawdo::{
        fingerprint, unique_output_path, ConvertError, Converter, ItemOutcome, Session, Stage,
    };
    use std::path::{Path, PathBuf};

    fn memory_converter() -> Converter<MemoryBackend> {
        Converter::new(HistoryStore::new(MemoryBackend::new()))
    }

    fn make_png(dir: &Path, name: &str, side: u32) -> (PathBuf, Vec<u8>) {
        let path = dir.join(name);
        let image = RgbImage::from_fn(side, side, |x, y| Rgb([x as u8, y as u8, 77]));
        let data = image.as_raw().clone();
        image.save(&path).unwrap();
        (path, data)
    }

    #[test]
    fn test_unique_output_path() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.png");
        assert_eq!(unique_output_path(&out), out);

        std::fs::write(&out, b"taken").unwrap();
        let first = unique_output_path(&out);
        assert_eq!(first, dir.path().join("out (1).png"));

        std::fs::write(&first, b"taken").unwrap();
        assert_eq!(unique_output_path(&out), dir.path().join("out (2).png"));
    }

    #[test]
    fn test_unique_output_path_without_extension() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("raw");
        std::fs::write(&out, b"taken").unwrap();
        assert_eq!(unique_output_path(&out), dir.path().join("raw (1)"));
    }

    #[test]
    fn test_fingerprint_follows_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.bin");
        std::fs::write(&path, b"one").unwrap();
        let before = fingerprint(&path).unwrap();
        assert_eq!(fingerprint(&path).unwrap(), before);

        std::fs::write(&path, b"two").unwrap();
        assert_ne!(fingerprint(&path).unwrap(), before);
        assert!(fingerprint(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_add_requires_readable_source() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new();
        let err = session
            .add(dir.path().join("missing.png"), dir.path().join("out.wav"), ConversionParams::new())
            .unwrap_err();
        assert!(matches!(err, ConvertError::Io { .. }));
        assert!(session.items().is_empty());
    }

    #[test]
    fn test_existing_output_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let (png, _) = make_png(dir.path(), "a.png", 4);
        let wav = dir.path().join("a.wav");
        std::fs::write(&wav, b"keep me").unwrap();

        let mut session = Session::new();
        session.add(&png, &wav, ConversionParams::new()).unwrap();
        let report = session.run(&mut memory_converter());

        match &report.outcomes[0].1 {
            ItemOutcome::Converted { output, .. } => {
                assert_eq!(output, &dir.path().join("a (1).wav"));
            }
            ItemOutcome::Skipped(e) => panic!("item skipped: {}", e),
        }
        assert_eq!(std::fs::read(&wav).unwrap(), b"keep me");
    }

    #[test]
    fn test_stale_item_is_skipped_and_batch_continues() {
        let dir = tempfile::tempdir().unwrap();
        let (first, _) = make_png(dir.path(), "first.png", 4);
        let (second, _) = make_png(dir.path(), "second.png", 6);

        let mut session = Session::new();
        session
            .add(&first, dir.path().join("first.wav"), ConversionParams::new())
            .unwrap();
        session
            .add(&second, dir.path().join("second.wav"), ConversionParams::new())
            .unwrap();

        make_png(dir.path(), "first.png", 5);

        let report = session.run(&mut memory_converter());
        assert_eq!(report.converted(), 1);
        assert_eq!(report.skipped(), 1);

        match &report.outcomes[0] {
            (0, ItemOutcome::Skipped(e)) => {
                assert!(matches!(e, ConvertError::StaleSourceItem { .. }));
                assert_eq!(e.stage(), Stage::Loaded);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(matches!(report.outcomes[1], (1, ItemOutcome::Converted { .. })));
        assert!(!dir.path().join("first.wav").exists());
        assert!(dir.path().join("second.wav").exists());
    }

    #[test]
    fn test_reciprocal_mode_converts_back() {
        let dir = tempfile::tempdir().unwrap();
        let (png, pixels) = make_png(dir.path(), "photo.png", 10);
        let wav = dir.path().join("photo.wav");
        let mut converter = memory_converter();

        let mut session = Session::new().with_reciprocal(true);
        let params = ConversionParams::new().with_companding(Companding::ALaw);
        session.add(&png, &wav, params).unwrap();

        let report = session.run(&mut converter);
        assert_eq!(report.converted(), 1);

        let item = &session.items()[0];
        assert_eq!(item.source(), wav.as_path());
        assert_eq!(item.output(), png.as_path());
        assert_eq!(item.params().companding, Some(Companding::InverseALaw));
        assert_eq!(item.fingerprint(), fingerprint(&wav).unwrap());

        let report = session.run(&mut converter);
        let back = match &report.outcomes[0].1 {
            ItemOutcome::Converted { output, report } => {
                assert!(report.params.from_history);
                output.clone()
            }
            ItemOutcome::Skipped(e) => panic!("item skipped: {}", e),
        };
        assert_eq!(back, dir.path().join("photo (1).png"));

        let restored = read_image_file(&back).unwrap().data;
        assert_eq!(restored.len(), pixels.len());
        assert!(restored
            .iter()
            .zip(&pixels)
            .all(|(&r, &p)| (r as i8 as i16 - p as i8 as i16).abs() <= 2));
    }

    #[test]
    fn test_without_reciprocal_items_stay_put() {
        let dir = tempfile::tempdir().unwrap();
        let (png, _) = make_png(dir.path(), "photo.png", 3);
        let wav = dir.path().join("photo.wav");

        let mut session = Session::new();
        session.add(&png, &wav, ConversionParams::new()).unwrap();
        session.run(&mut memory_converter());

        assert_eq!(session.items()[0].source(), png.as_path());
        assert_eq!(session.items()[0].output(), wav.as_path());
    }

    #[test]
    fn test_edit_and_remove_items() {
        let dir = tempfile::tempdir().unwrap();
        let (png, _) = make_png(dir.path(), "photo.png", 2);

        let mut session = Session::new();
        let index = session
            .add(&png, dir.path().join("photo.wav"), ConversionParams::new())
            .unwrap();

        assert!(session.set_params(index, ConversionParams::new().with_channels(1)));
        assert_eq!(session.items()[index].params().channels, Some(1));
        assert!(!session.set_params(7, ConversionParams::new()));

        assert!(session.remove(7).is_none());
        assert!(session.remove(index).is_some());
        assert!(session.items().is_empty());
    }
}
