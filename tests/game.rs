use roadtrip::{
    car::{integrate, CarState, Input, Thrust, Tuning},
    config::settings::{Camera as CameraParams, Car, Game as GameParams, Road, Scenery},
    game::{Controls, Cue, EngineSound, Game, Screen, Status, Sun},
    road::Corridor,
    scenery::{base_disc, roadside, Scatter, BASE_COLOR},
    space::{Camera, Look},
};

use cgmath::{MetricSpace as _, Point2};
use rand::{rngs::StdRng, SeedableRng as _};

const EPSILON: f32 = 1e-4;

fn straight_corridor() -> Corridor {
    let points = (0..=5).map(|i| Point2::new(0.0, 6.0 * i as f32)).collect();
    Corridor::from_points(points, 4.0).unwrap()
}

fn new_game() -> Game {
    Game::new(straight_corridor(), Car::default(), GameParams::default())
}

fn forward() -> Controls {
    Controls {
        drive: Input {
            forward: true,
            ..Input::default()
        },
        ..Controls::default()
    }
}

#[test]
fn drive_to_the_finish() {
    let mut game = new_game();
    for _ in 0..10 {
        game.step(&forward(), 0.1);
    }
    assert_eq!(game.status, Status::Driving);
    assert!((game.car.speed - 0.5).abs() < EPSILON);
    assert!(game.car.position.x.abs() < EPSILON);
    assert!((game.car.position.y - 13.2).abs() < 1e-3);

    let mut steps = 10;
    while game.status == Status::Driving && steps < 100 {
        game.step(&forward(), 0.1);
        steps += 1;
    }
    assert_eq!(game.status, Status::GameWon);
    assert_eq!(steps, 21);
    let time = game.best_time().unwrap();
    assert!((time - 2.1).abs() < 1e-3);
    assert!(game.hud().contains(&format!("YOU WIN! Time: {:.2}s", time)));
}

#[test]
fn generated_straight_road() {
    let params = Road {
        step_count: 5,
        step_length: 6.0,
        max_turn: 0.0,
        ..Road::default()
    };
    let corridor = Corridor::generate(&params, &mut StdRng::seed_from_u64(0)).unwrap();
    let mut game = Game::new(corridor, Car::default(), GameParams::default());
    let mut last_z = game.car.position.y;
    for _ in 0..10 {
        game.step(&forward(), 0.1);
        assert!(game.car.position.y > last_z);
        last_z = game.car.position.y;
        assert_eq!(game.status, Status::Driving);
    }
    assert!((game.car.speed - 0.5).abs() < EPSILON);
    assert!(game.car.position.x.abs() < EPSILON);
}

#[test]
fn difficulty_is_clamped_on_start() {
    let params = Car {
        times: 9.0,
        ..Car::default()
    };
    let game = Game::new(straight_corridor(), params, GameParams::default());
    assert_eq!(game.car.times, 4.9);
    assert_eq!(game.hud()[2], "Times: 4.9");

    let params = Car {
        times: 0.0,
        ..Car::default()
    };
    let game = Game::new(straight_corridor(), params, GameParams::default());
    assert_eq!(game.car.times, 0.5);
}

#[test]
fn screens() {
    let viewer = Screen::Viewer;
    let driving = viewer.select(3);
    assert_eq!(driving, Screen::Driving { texture: 3 });
    // enter restarts the game instead while driving
    assert_eq!(driving.select(5), driving);
    assert_eq!(driving.back(), Some(Screen::Viewer));
    assert_eq!(viewer.back(), None);
}

#[test]
fn win_takes_precedence() {
    let params = GameParams {
        road_tolerance: 0.5,
        ..GameParams::default()
    };
    let mut game = Game::new(straight_corridor(), Car::default(), params);
    game.car.position = Point2::new(1.0, 30.0);
    assert_eq!(game.check_status(), Status::GameWon);
}

#[test]
fn leaving_the_road() {
    let mut game = new_game();
    game.car.position = Point2::new(10.0, 5.0);
    let cues = game.step(&Controls::default(), 0.1);
    assert_eq!(game.status, Status::GameOver);
    assert_eq!(cues, vec![Cue::Crash]);
    assert_eq!(game.best_time(), None);

    let hud = game.hud();
    assert!(hud.contains(&"GAME OVER".to_string()));
    assert!(hud.contains(&"Press ENTER to Restart".to_string()));

    // frozen until restarted
    let cues = game.step(&forward(), 0.1);
    assert!(cues.is_empty());
    assert_eq!(game.car.position, Point2::new(10.0, 5.0));
    assert_eq!(game.car.speed, 0.0);
}

#[test]
fn restart_keeps_difficulty() {
    let mut game = new_game();
    game.car.times = 3.0;
    game.car.heading = 45.0;
    game.car.position = Point2::new(-10.0, 5.0);
    game.step(&Controls::default(), 0.1);
    assert_eq!(game.status, Status::GameOver);

    let restart = Controls {
        restart: true,
        ..Controls::default()
    };
    game.step(&restart, 0.1);
    assert_eq!(game.status, Status::Driving);
    assert_eq!(game.car.position, game.corridor.start());
    assert_eq!(game.car.heading, 0.0);
    assert_eq!(game.car.speed, 0.0);
    assert_eq!(game.car.times, 3.0);
    assert_eq!(game.run_time(), None);

    // crash plays again on the next run
    game.car.position = Point2::new(-10.0, 5.0);
    assert_eq!(game.step(&Controls::default(), 0.1), vec![Cue::Crash]);
}

#[test]
fn winning_idles_the_engine() {
    let mut game = new_game();
    game.step(&forward(), 0.1);
    assert_eq!(game.engine(), EngineSound::Acceleration);
    game.car.position = Point2::new(0.0, 29.5);
    let cues = game.step(&Controls::default(), 0.1);
    assert_eq!(game.status, Status::GameWon);
    assert_eq!(cues, vec![Cue::Engine(EngineSound::Idle)]);
}

#[test]
fn engine_and_horn_cues() {
    let mut game = new_game();
    assert_eq!(
        game.step(&forward(), 0.1),
        vec![Cue::Engine(EngineSound::Acceleration)]
    );
    assert!(game.step(&forward(), 0.1).is_empty());

    let braking = Controls {
        drive: Input {
            backward: true,
            ..Input::default()
        },
        ..Controls::default()
    };
    assert_eq!(
        game.step(&braking, 0.1),
        vec![Cue::Engine(EngineSound::Brake)]
    );

    let horn = Controls {
        horn: true,
        ..Controls::default()
    };
    let cues = game.step(&horn, 0.1);
    assert!(cues.contains(&Cue::Horn));
    assert!(cues.contains(&Cue::Engine(EngineSound::Idle)));
    assert!(!game.step(&horn, 0.1).contains(&Cue::Horn));
    game.step(&Controls::default(), 0.1);
    assert!(game.step(&horn, 0.1).contains(&Cue::Horn));
}

#[test]
fn timer_starts_on_input() {
    let mut game = new_game();
    game.step(&Controls::default(), 0.1);
    assert_eq!(game.run_time(), None);
    assert_eq!(game.hud().len(), 3);

    let steer = Controls {
        drive: Input {
            left: true,
            ..Input::default()
        },
        ..Controls::default()
    };
    game.step(&steer, 0.1);
    assert!((game.run_time().unwrap() - 0.1).abs() < EPSILON);
    // long frames are clamped
    game.step(&Controls::default(), 1.0);
    assert!((game.run_time().unwrap() - 0.2).abs() < EPSILON);
    assert_eq!(game.hud()[3], "Time: 0.20s");
}

#[test]
fn best_time_is_the_minimum() {
    let mut game = new_game();
    let restart = Controls {
        restart: true,
        ..Controls::default()
    };
    let finish = |game: &mut Game, frames: usize| {
        for _ in 0..frames {
            game.step(&forward(), 0.1);
            game.car.position = Point2::new(0.0, 1.0);
        }
        game.car.position = Point2::new(0.0, 29.0);
        game.step(&Controls::default(), 0.1);
        assert_eq!(game.status, Status::GameWon);
    };

    finish(&mut game, 5);
    let first = game.best_time().unwrap();
    game.step(&restart, 0.1);
    finish(&mut game, 10);
    assert_eq!(game.best_time(), Some(first));
    game.step(&restart, 0.1);
    finish(&mut game, 2);
    assert!(game.best_time().unwrap() < first);
    assert!(game.hud()[0].starts_with("Best Time: "));
}

#[test]
fn hud_lines() {
    let mut game = new_game();
    game.car.speed = 0.456;
    assert_eq!(game.hud(), vec!["Best Time: 0.00s", "Speed: 45", "Times: 1.0"]);
}

#[test]
fn speed_limits() {
    let params = Car::default();
    let mut car = CarState::new(Point2::new(0.0, 0.0), 1.0);
    let back = Input {
        backward: true,
        ..Input::default()
    };
    for _ in 0..20 {
        integrate(&mut car, &back, 0.1, &params);
    }
    assert!((car.speed + Tuning::BASE.max_speed * 0.5).abs() < EPSILON);

    let ahead = Input {
        forward: true,
        ..Input::default()
    };
    assert_eq!(integrate(&mut car, &ahead, 0.1, &params), Thrust::Forward);
    // braking out of reverse
    assert!((car.speed - (-0.25 + 0.05 * 1.5)).abs() < EPSILON);

    car.speed = 0.3;
    integrate(&mut car, &back, 0.1, &params);
    assert!((car.speed - 0.225).abs() < EPSILON);
}

#[test]
fn friction_stops_at_zero() {
    let params = Car::default();
    let mut car = CarState::new(Point2::new(0.0, 0.0), 1.0);
    car.speed = 0.01;
    assert_eq!(
        integrate(&mut car, &Input::default(), 0.1, &params),
        Thrust::Coasting
    );
    assert_eq!(car.speed, 0.0);
    car.speed = -0.01;
    integrate(&mut car, &Input::default(), 0.1, &params);
    assert_eq!(car.speed, 0.0);
}

#[test]
fn steering() {
    let params = Car::default();
    let mut car = CarState::new(Point2::new(0.0, 0.0), 1.0);
    let left = Input {
        left: true,
        ..Input::default()
    };
    integrate(&mut car, &left, 0.1, &params);
    assert_eq!(car.heading, 0.0);
    assert_eq!(car.position, Point2::new(0.0, 0.0));

    car.speed = 0.5;
    let keep = Input {
        forward: true,
        left: true,
        ..Input::default()
    };
    integrate(&mut car, &keep, 0.1, &params);
    assert!((car.heading - 4.2).abs() < EPSILON);
    assert!(car.position.x > 0.0);

    let right = Input {
        forward: true,
        right: true,
        ..Input::default()
    };
    integrate(&mut car, &right, 0.1, &params);
    assert!(car.heading.abs() < EPSILON);
}

#[test]
fn times_are_clamped() {
    let params = Car::default();
    let mut car = CarState::new(Point2::new(0.0, 0.0), 1.0);
    let faster = Input {
        faster: true,
        ..Input::default()
    };
    integrate(&mut car, &faster, 0.1, &params);
    assert!((car.times - 1.15).abs() < EPSILON);
    for _ in 0..100 {
        integrate(&mut car, &faster, 0.1, &params);
    }
    assert_eq!(car.times, 4.9);
    let slower = Input {
        slower: true,
        ..Input::default()
    };
    for _ in 0..100 {
        integrate(&mut car, &slower, 0.1, &params);
    }
    assert_eq!(car.times, 0.5);
    assert!((car.tuning().max_speed - 0.25).abs() < EPSILON);
}

#[test]
fn camera_follows_the_car() {
    let params = CameraParams::default();
    let mut camera = Camera::new(&params, 1.0);
    let mut car = CarState::new(Point2::new(0.0, 0.0), 1.0);

    camera.follow(&car, Look::Back, &params);
    assert!(camera.eye.distance(cgmath::Point3::new(0.0, 4.0, -10.0)) < EPSILON);
    assert_eq!(camera.target, cgmath::Point3::new(0.0, 0.0, 0.0));
    camera.follow(&car, Look::Left, &params);
    assert!(camera.eye.distance(cgmath::Point3::new(10.0, 4.0, 0.0)) < EPSILON);

    car.heading = 90.0;
    car.position = Point2::new(5.0, 5.0);
    camera.follow(&car, Look::Back, &params);
    assert!(camera.eye.distance(cgmath::Point3::new(-5.0, 4.0, 5.0)) < EPSILON);
    camera.follow(&car, Look::Front, &params);
    assert!(camera.eye.distance(cgmath::Point3::new(15.0, 4.0, 5.0)) < EPSILON);
    assert_eq!(camera.target, cgmath::Point3::new(5.0, 0.0, 5.0));
}

#[test]
fn orbit_camera() {
    let mut camera = Camera::new(&CameraParams::default(), 1.0);
    camera.orbit(0.0, 0.0, 12.0);
    assert!(camera.eye.distance(cgmath::Point3::new(0.0, 0.0, 12.0)) < EPSILON);
    camera.orbit(90.0, 0.0, 12.0);
    assert!(camera.eye.distance(cgmath::Point3::new(-12.0, 0.0, 0.0)) < EPSILON);
}

#[test]
fn sun_drifts_and_turns() {
    let mut sun = Sun::new();
    sun.advance(0.0, 0.1);
    assert!((sun.angle - Sun::DRIFT).abs() < EPSILON);
    sun.advance(1.0, 0.1);
    assert!((sun.angle - 12.2).abs() < EPSILON);

    let sun = Sun { angle: 0.0 };
    assert_eq!(sun.position(100.0, 50.0), [0.0, 50.0, 100.0]);
}

#[test]
fn roadside_trees() {
    let corridor = straight_corridor();
    let params = Scenery::default();
    let trees = roadside(&corridor, &params, &mut StdRng::seed_from_u64(5));
    assert!(trees.len() >= 5 && trees.len() <= 15);
    for tree in trees.iter() {
        // segments run along +Z, so the distance is all sideways
        let side = tree.position.x.abs();
        assert!(side >= 4.0 - EPSILON && side <= 12.0 + EPSILON);
        assert_eq!(tree.scale, params.tree_scale);
        assert!(!corridor.contains(tree.position, corridor.width() * 0.5));
    }
}

#[test]
fn scattered_props_keep_apart() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut occupied = Vec::new();
    let trees = Scatter::TREES.place(&mut occupied, &mut rng);
    let grass = Scatter::GRASS.place(&mut occupied, &mut rng);
    assert!(!trees.is_empty() && trees.len() <= Scatter::TREES.count);
    assert!(grass.len() <= Scatter::GRASS.count);
    assert_eq!(occupied.len(), trees.len() + grass.len());

    for (i, tree) in trees.iter().enumerate() {
        let r = tree.position.distance(Point2::new(0.0, 0.0));
        assert!(r >= 5.0 - EPSILON && r <= 21.0 + EPSILON);
        for other in trees[i + 1..].iter() {
            assert!(tree.position.distance(other.position) > Scatter::TREES.min_distance);
        }
        for tuft in grass.iter() {
            assert!(tree.position.distance(tuft.position) > Scatter::GRASS.min_distance);
        }
    }
    assert!(grass.iter().all(|g| g.variant < 2 && g.scale == 0.5));
}

#[test]
fn base_disc_is_a_fan() {
    let disc = base_disc(25.0, -0.01);
    let buffer = disc.draw_buffer(Some("base")).unwrap();
    assert_eq!(buffer.vertex_count(), 72 * 3);
    assert!(buffer.vertices.iter().all(|v| v.pos[1] == -0.01));
    assert!(buffer.vertices.iter().all(|v| v.normal == [0.0; 3]));
    assert_eq!(disc.materials["base"].diffuse, BASE_COLOR);
}
