use crate::geom::{
    DrawCommand, LodMode, LodThresholds, Point3, Spine, select_lod_batches, select_lod_draw_commands,
};

fn x_spine(count: usize) -> Spine {
    Spine::new((0..count).map(|i| Point3::new(i as f64, 0.0, 0.0)).collect())
}

fn covered(spine: &Spine, camera: Point3, thresholds: LodThresholds, mode: LodMode) -> Vec<usize> {
    select_lod_batches(spine, camera, thresholds)
        .into_iter()
        .filter(|batch| batch.mode == mode)
        .flat_map(|batch| batch.segments)
        .collect()
}

#[test]
fn long_spine_splits_into_three_regions() {
    let spine = x_spine(101);
    let thresholds = LodThresholds::new(10.0, 50.0);

    assert_eq!(covered(&spine, Point3::ORIGIN, thresholds, LodMode::Full), (0..10).collect::<Vec<_>>());
    assert_eq!(covered(&spine, Point3::ORIGIN, thresholds, LodMode::Line), (10..50).collect::<Vec<_>>());
    assert_eq!(covered(&spine, Point3::ORIGIN, thresholds, LodMode::Skip), (50..100).collect::<Vec<_>>());
}

#[test]
fn batches_partition_segments_in_order() {
    let spine = x_spine(101);
    let batches = select_lod_batches(&spine, Point3::new(30.0, 5.0, 0.0), LodThresholds::new(10.0, 50.0));

    let mut next = 0;
    for batch in &batches {
        assert!(!batch.is_empty());
        assert_eq!(batch.segments.start, next);
        next = batch.segments.end;
    }
    assert_eq!(next, spine.segment_count());
}

#[test]
fn default_thresholds_draw_everything_full() {
    let spine = x_spine(20);
    let commands = select_lod_draw_commands(&spine, Point3::ORIGIN, LodThresholds::default());
    let expected: Vec<DrawCommand> = (0..19).map(|segment| DrawCommand::TriangleStrip { segment }).collect();
    assert_eq!(commands, expected);
}

#[test]
fn disabled_far_threshold_never_skips() {
    let spine = x_spine(101);
    let thresholds = LodThresholds::new(10.0, -1.0);
    assert!(covered(&spine, Point3::ORIGIN, thresholds, LodMode::Skip).is_empty());
    assert_eq!(covered(&spine, Point3::ORIGIN, thresholds, LodMode::Line), (10..100).collect::<Vec<_>>());
}

#[test]
fn line_strips_join_their_batch_endpoints() {
    let spine = x_spine(101);
    let commands = select_lod_draw_commands(&spine, Point3::ORIGIN, LodThresholds::new(10.0, 50.0));

    let strips = commands
        .iter()
        .filter(|command| matches!(command, DrawCommand::TriangleStrip { .. }))
        .count();
    assert_eq!(strips, 10);

    let mut line_points = Vec::new();
    for command in &commands {
        if let DrawCommand::LineStrip { points } = command {
            assert!(points.len() >= 2);
            assert!(points.windows(2).all(|pair| pair[1] == pair[0] + 1));
            line_points.push((points[0], points[points.len() - 1]));
        }
    }
    assert_eq!(line_points.first().map(|p| p.0), Some(10));
    assert_eq!(line_points.last().map(|p| p.1), Some(50));
}

#[test]
fn closed_spine_lines_wrap_to_start() {
    let spine = Spine::closed_loop(vec![
        Point3::new(100.0, 0.0, 0.0),
        Point3::new(101.0, 0.0, 0.0),
        Point3::new(101.0, 1.0, 0.0),
        Point3::new(100.0, 1.0, 0.0),
    ]);
    let commands = select_lod_draw_commands(&spine, Point3::ORIGIN, LodThresholds::new(10.0, -1.0));
    assert_eq!(commands, vec![DrawCommand::LineStrip { points: vec![0, 1, 2, 3, 0] }]);
}

#[test]
fn everything_beyond_far_is_skipped() {
    let spine = x_spine(5);
    let camera = Point3::new(0.0, 500.0, 0.0);
    assert!(select_lod_draw_commands(&spine, camera, LodThresholds::new(10.0, 50.0)).is_empty());
}

#[test]
fn short_spine_is_not_batched() {
    let spine = Spine::new(vec![Point3::ORIGIN]);
    assert!(select_lod_batches(&spine, Point3::ORIGIN, LodThresholds::default()).is_empty());
}
