//! Property-based tests for tag text passes and tracking state

use ass_motion::data::{DataHandler, FrameState};
use ass_motion::motion::transform::{detokenize, tokenize_transforms};
use ass_motion::motion::{deduplicate_tags, position_math};
use proptest::prelude::*;

const SNIPPETS: &[&str] = &[
    r"{\fscx120}",
    r"{\t(0,100,\frz30)}",
    r"{\pos(1,2)\t(\blur2)}",
    r"{\t(0,50,2,\1c&HFF0000&)\t(50,100,\fs20)}",
    r"{\pos(3,4)}{\pos(5,6)}",
    r"{\move(0,0,10,10)\pos(2,2)}",
    r"{\an5\an7}",
    r"{\fscx10\fscx20\bord3}",
    r"{\clip()}",
    r"{}",
    r"{\fad(100,200)}",
    r"{\blur1\t(0,20,\blur3)\blur2}",
];

fn arb_line_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            prop::sample::select(SNIPPETS.to_vec()).prop_map(str::to_string),
            "[a-z ]{0,8}",
        ],
        0..8,
    )
    .prop_map(|parts| parts.concat())
}

#[derive(Debug, Clone, Copy)]
struct Row {
    x: i32,
    y: i32,
    scale_x: i32,
    scale_y: i32,
    rotation: i32,
}

fn arb_rows() -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec(
        (-500..500i32, -500..500i32, 1..400i32, 1..400i32, -180..180i32).prop_map(
            |(x, y, scale_x, scale_y, rotation)| Row {
                x,
                y,
                scale_x,
                scale_y,
                rotation,
            },
        ),
        1..8,
    )
}

fn keyframe_text(rows: &[Row]) -> String {
    let mut text = String::from(
        "Adobe After Effects 6.0 Keyframe Data\n\tSource Width\t100\n\tSource Height\t100\n",
    );
    text.push_str("Position\n");
    for (i, row) in rows.iter().enumerate() {
        text.push_str(&format!("\t{}\t{}\t{}\n", i + 1, row.x, row.y));
    }
    text.push_str("Scale\n");
    for (i, row) in rows.iter().enumerate() {
        text.push_str(&format!("\t{}\t{}\t{}\n", i + 1, row.scale_x, row.scale_y));
    }
    text.push_str("Rotation\n");
    for (i, row) in rows.iter().enumerate() {
        text.push_str(&format!("\t{}\t{}\n", i + 1, row.rotation));
    }
    text.push_str("End of Keyframe Data\n");
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn transforms_round_trip(text in arb_line_text()) {
            let (tokenized, transforms) = tokenize_transforms(&text, 1000);
            prop_assert!(!tokenized.contains(r"\t("));
            prop_assert_eq!(detokenize(&tokenized, &transforms, 0, 0), text);
        }

        #[test]
        fn deduplication_is_idempotent(text in arb_line_text()) {
            let once = deduplicate_tags(&text);
            prop_assert_eq!(deduplicate_tags(&once), once.clone());
        }

        #[test]
        fn reference_frame_is_identity(rows in arb_rows(), pick in any::<prop::sample::Index>()) {
            let mut data = DataHandler::parse(&keyframe_text(&rows), 100.0, 100.0).unwrap();
            prop_assert_eq!(data.length(), rows.len());

            let reference = pick.index(rows.len()) + 1;
            data.add_reference_frame(reference);
            let state = data.state_at(reference);
            prop_assert_eq!(state.x_ratio, 1.0);
            prop_assert_eq!(state.y_ratio, 1.0);
            prop_assert_eq!(state.x_current, state.x_start);
            prop_assert_eq!(state.y_current, state.y_start);
            prop_assert_eq!(state.z_rotation_diff, 0.0);
        }

        #[test]
        fn checked_length_matches_rows(rows in arb_rows()) {
            let data = DataHandler::parse(&keyframe_text(&rows), 100.0, 100.0).unwrap();
            prop_assert!(data.check_length(rows.len()));
            prop_assert!(!data.check_length(rows.len() + 1));
        }

        #[test]
        fn unmoved_point_is_fixed(
            x in -2000.0..2000.0f64,
            y in -2000.0..2000.0f64,
            ratio in 0.1..10.0f64,
        ) {
            let state = FrameState {
                x_start: x,
                y_start: y,
                x_current: x,
                y_current: y,
                x_ratio: ratio,
                y_ratio: ratio,
                ..FrameState::default()
            };
            prop_assert_eq!(position_math(x, y, &state), (x, y));
        }
    }
}
