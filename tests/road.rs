use roadtrip::{
    config::settings::{HeadingMode, Road},
    road::{Corridor, RoadError, Segment, GROUND_HEIGHT, PAVED_HEIGHT},
};

use cgmath::Point2;
use rand::{rngs::StdRng, SeedableRng as _};

fn straight(segments: usize) -> Corridor {
    let points = (0..=segments)
        .map(|i| Point2::new(0.0, 6.0 * i as f32))
        .collect();
    Corridor::from_points(points, 4.0).unwrap()
}

#[test]
fn distance_is_clamped_to_the_segment() {
    let segment = Segment::new(Point2::new(0.0, 0.0), Point2::new(0.0, 10.0));
    assert_eq!(segment.distance2(Point2::new(3.0, 5.0)), Some(9.0));
    assert_eq!(segment.distance2(Point2::new(3.0, 14.0)), Some(25.0));
    assert_eq!(segment.distance2(Point2::new(0.0, -2.0)), Some(4.0));
    // the infinite line would pass through this point
    assert!(!segment.contains(Point2::new(0.0, 13.0), 2.0));
    assert!(segment.contains(Point2::new(0.0, 11.5), 2.0));
}

#[test]
fn zero_length_segment() {
    let p = Point2::new(1.0, 1.0);
    let segment = Segment::new(p, p);
    assert_eq!(segment.distance2(p), None);
    assert!(!segment.contains(p, 2.0));
    assert!(segment.left().is_none());
    assert!(segment.quad(2.0).is_none());
}

#[test]
fn left_points_left() {
    let segment = Segment::new(Point2::new(0.0, 0.0), Point2::new(0.0, 6.0));
    let left = segment.left().unwrap();
    assert_eq!((left.x, left.y), (1.0, 0.0));
    assert_eq!(segment.length(), 6.0);
    assert_eq!(segment.midpoint(), Point2::new(0.0, 3.0));
}

#[test]
fn containment_is_a_union() {
    let points = vec![
        Point2::new(0.0, 0.0),
        Point2::new(0.0, 10.0),
        Point2::new(10.0, 10.0),
    ];
    let corridor = Corridor::from_points(points, 4.0).unwrap();
    assert!(corridor.contains(Point2::new(1.0, 3.0), 2.0));
    assert!(corridor.contains(Point2::new(7.0, 11.0), 2.0));
    assert!(corridor.contains(Point2::new(11.5, 10.0), 2.0));
    assert!(!corridor.contains(Point2::new(6.0, 5.0), 2.0));
    assert!(!corridor.contains(Point2::new(-3.0, 0.0), 2.0));
}

#[test]
fn joints_are_on_the_road() {
    let points = vec![
        Point2::new(0.0, 0.0),
        Point2::new(10.0, 0.0),
        Point2::new(20.0, 0.0),
    ];
    let corridor = Corridor::from_points(points, 4.0).unwrap();
    assert!(corridor.contains(Point2::new(10.0, 0.0), 2.0));
    assert!(corridor.contains(Point2::new(10.0, 1.9), 2.0));
    assert!(!corridor.contains(Point2::new(10.0, 2.5), 2.0));
    assert!(!corridor.contains(Point2::new(22.5, 0.0), 2.0));
}

#[test]
fn from_points_drops_repeats() {
    let points = vec![
        Point2::new(0.0, 0.0),
        Point2::new(0.0, 0.0),
        Point2::new(0.0, 5.0),
    ];
    let corridor = Corridor::from_points(points, 4.0).unwrap();
    assert_eq!(corridor.segments().len(), 1);
    assert_eq!(corridor.start(), Point2::new(0.0, 0.0));
    assert_eq!(corridor.end(), Point2::new(0.0, 5.0));

    let single = vec![Point2::new(1.0, 1.0), Point2::new(1.0, 1.0)];
    assert_eq!(
        Corridor::from_points(single, 4.0).unwrap_err(),
        RoadError::NoSteps
    );
    assert_eq!(
        Corridor::from_points(vec![Point2::new(0.0, 0.0), Point2::new(0.0, 1.0)], 0.0).unwrap_err(),
        RoadError::BadWidth(0.0)
    );
}

#[test]
fn generation_is_deterministic() {
    let params = Road {
        seed: Some(7),
        ..Road::default()
    };
    let a = Corridor::generate(&params, &mut StdRng::seed_from_u64(7)).unwrap();
    let b = Corridor::generate(&params, &mut StdRng::seed_from_u64(7)).unwrap();
    assert_eq!(a.points(), b.points());
    assert_eq!(a.points().len(), params.step_count + 1);
    assert_eq!(a.start(), Point2::new(0.0, 0.0));
    for segment in a.segments() {
        assert!((segment.length() - params.step_length).abs() < 1e-3);
    }
}

#[test]
fn absolute_headings_keep_going_forward() {
    let params = Road {
        heading: HeadingMode::Absolute,
        max_turn: 30.0,
        ..Road::default()
    };
    let corridor = Corridor::generate(&params, &mut StdRng::seed_from_u64(3)).unwrap();
    for segment in corridor.segments() {
        // never more than 30 degrees off +Z
        let dir = segment.direction().unwrap();
        assert!(dir.y >= 30f32.to_radians().cos() - 1e-4);
    }
}

#[test]
fn straight_road_without_turns() {
    let params = Road {
        step_count: 10,
        max_turn: 0.0,
        ..Road::default()
    };
    let corridor = Corridor::generate(&params, &mut StdRng::seed_from_u64(1)).unwrap();
    let end = corridor.end();
    assert!(end.x.abs() < 1e-4);
    assert!((end.y - 60.0).abs() < 1e-3);
}

#[test]
fn generation_errors() {
    let mut rng = StdRng::seed_from_u64(0);
    let bad_steps = Road {
        step_count: 0,
        ..Road::default()
    };
    assert_eq!(
        Corridor::generate(&bad_steps, &mut rng).unwrap_err(),
        RoadError::NoSteps
    );
    let bad_length = Road {
        step_length: -1.0,
        ..Road::default()
    };
    assert_eq!(
        Corridor::generate(&bad_length, &mut rng).unwrap_err(),
        RoadError::BadStepLength(-1.0)
    );
    let bad_turn = Road {
        max_turn: f32::NAN,
        ..Road::default()
    };
    assert!(matches!(
        Corridor::generate(&bad_turn, &mut rng),
        Err(RoadError::BadTurn(_))
    ));
    let bad_width = Road {
        width: 0.0,
        ..Road::default()
    };
    assert_eq!(
        Corridor::generate(&bad_width, &mut rng).unwrap_err(),
        RoadError::BadWidth(0.0)
    );
}

#[test]
fn quads_follow_segments() {
    let corridor = straight(5);
    let paved = corridor.paved_quads();
    assert_eq!(paved.len(), 5);
    assert_eq!(paved[0].left_start, Point2::new(2.0, 0.0));
    assert_eq!(paved[0].right_start, Point2::new(-2.0, 0.0));
    assert_eq!(paved[0].left_end, Point2::new(2.0, 6.0));
    let grass = corridor.grass_quads();
    assert_eq!(grass[0].left_start, Point2::new(17.0, 0.0));
}

#[test]
fn surface_layers() {
    let corridor = straight(5);
    let surface = corridor.surface();
    assert_eq!(surface.ground.len(), 12);
    // one quad per segment plus a connector per joint
    assert_eq!(surface.paved.len(), (5 + 4) * 6);
    assert_eq!(surface.grass.len(), (5 + 4) * 6);
    assert!(surface.ground.iter().all(|v| v.pos[1] == GROUND_HEIGHT));
    assert!(surface.paved.iter().all(|v| v.pos[1] == PAVED_HEIGHT));
    assert!(surface.grass.iter().all(|v| v.pos[1] < PAVED_HEIGHT));

    let model = corridor.surface_model();
    let names = model
        .draw_buffers
        .iter()
        .map(|buffer| buffer.material.as_deref().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(names, ["ground", "grass", "road"]);
    assert_eq!(model.materials.len(), 3);
}
