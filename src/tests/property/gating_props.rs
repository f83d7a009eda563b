use proptest::prelude::*;

use crate::core::pipeline::gating::{check_render_submission, script_gate, EditLockReason};
use crate::database::models::ContentItemRecord;

fn status_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => Just("script_generated".to_string()),
        1 => Just("generating_script".to_string()),
        1 => Just("generating_audio".to_string()),
        1 => Just("video_complete".to_string()),
        1 => "[a-z_]{1,24}",
    ]
}

proptest! {
    /// Editable iff no audio, no images, no video, and the item sits
    /// exactly at script_generated — and each violated condition shows up
    /// as its own reason.
    #[test]
    fn script_gate_matches_truth_table(
        has_audio in any::<bool>(),
        image_count in 0usize..4,
        has_video in any::<bool>(),
        status in status_strategy(),
    ) {
        let mut item = ContentItemRecord::new(1, "still_images");
        item.status = status.clone();
        if has_audio {
            item.audio_url = Some("https://cdn.example.com/a.mp3".to_string());
        }
        let images: Vec<String> = (0..image_count)
            .map(|i| format!("https://cdn.example.com/{i}.png"))
            .collect();
        item.set_image_urls(&images);
        if has_video {
            item.video_url = Some("https://cdn.example.com/v.mp4".to_string());
        }

        let gate = script_gate(&item);

        let in_script_stage = status == "script_generated";
        let expected = !has_audio && image_count == 0 && !has_video && in_script_stage;
        prop_assert_eq!(gate.editable, expected);
        prop_assert_eq!(gate.editable, gate.reasons.is_empty());

        prop_assert_eq!(gate.reasons.contains(&EditLockReason::AudioExists), has_audio);
        prop_assert_eq!(gate.reasons.contains(&EditLockReason::ImagesExist), image_count > 0);
        prop_assert_eq!(
            gate.reasons.contains(&EditLockReason::NotInScriptStage),
            !in_script_stage
        );
        prop_assert_eq!(gate.reasons.contains(&EditLockReason::VideoExists), has_video);
    }

    /// Render submission rejects exactly the items missing their required
    /// source assets, listed per category.
    #[test]
    fn render_submission_enumerates_offenders(
        specs in proptest::collection::vec((any::<bool>(), 0usize..3), 0..8),
    ) {
        let items: Vec<ContentItemRecord> = specs
            .iter()
            .enumerate()
            .map(|(i, (stock, asset_count))| {
                let source = if *stock { "stock_footage" } else { "still_images" };
                let mut item = ContentItemRecord::new(1, source);
                item.id = i as i64 + 1;
                let assets: Vec<String> =
                    (0..*asset_count).map(|n| format!("asset-{n}")).collect();
                if *stock {
                    item.set_footage_refs(&assets);
                } else {
                    item.set_image_urls(&assets);
                }
                item
            })
            .collect();

        let expected_missing_images: Vec<i64> = specs
            .iter()
            .enumerate()
            .filter(|(_, (stock, count))| !stock && *count == 0)
            .map(|(i, _)| i as i64 + 1)
            .collect();
        let expected_missing_footage: Vec<i64> = specs
            .iter()
            .enumerate()
            .filter(|(_, (stock, count))| *stock && *count == 0)
            .map(|(i, _)| i as i64 + 1)
            .collect();

        match check_render_submission(&items) {
            Ok(()) => {
                prop_assert!(expected_missing_images.is_empty());
                prop_assert!(expected_missing_footage.is_empty());
            }
            Err(blocked) => {
                prop_assert_eq!(blocked.missing_images, expected_missing_images);
                prop_assert_eq!(blocked.missing_footage, expected_missing_footage);
            }
        }
    }
}
