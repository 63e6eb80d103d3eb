use proptest::prelude::*;
use sonarnav::models::{
    Bearing, Category, CollisionPredictor, Creature, EscapePlanner, PursuitMotion, Point, Quadrant,
    RadarLog, Sighting, Vector2D, locate,
};
use sonarnav::scenario::EngineConfig;

prop_compose! {
    fn arb_point()(x in 0i32..=9999, y in 0i32..=9999) -> Point {
        Point::new(x, y)
    }
}

prop_compose! {
    fn arb_velocity(max: f64)(x in -max..=max, y in -max..=max) -> Vector2D {
        Vector2D::new(x, y)
    }
}

prop_compose! {
    fn arb_monster()(
        position in arb_point(),
        velocity in arb_velocity(540.0)
    ) -> Creature {
        Creature::new(1, -1, Category::Monster).with_state(position, velocity)
    }
}

prop_compose! {
    /// 深度帯の中に置いた魚
    fn arb_fish()(kind in 0i32..=2, x in 0i32..=9999, offset in 0i32..2500) -> Creature {
        let category = Category::from_kind(kind).unwrap_or(Category::Target(0));
        let y = category.level().depth_band().min + offset;
        Creature::new(4, 0, category).with_state(Point::new(x, y), Vector2D::zero())
    }
}

prop_compose! {
    fn arb_fish_velocity()(angle in 0usize..360, speed in 0.0f64..=400.0) -> Vector2D {
        Vector2D::new(1.0, 0.0).rotate(angle as f64).scaled(speed)
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn test_collision_is_translation_invariant(
        from in arb_point(),
        to in arb_point(),
        monster in arb_monster(),
        dx in -2000i32..2000,
        dy in -2000i32..2000
    ) {
        let predictor = CollisionPredictor::from_config(&EngineConfig::default());
        let shift = |p: Point| Point::new(p.x + dx, p.y + dy);
        let moved = monster.clone().with_state(shift(monster.position), monster.velocity);

        prop_assert_eq!(
            predictor.collides(from, &monster, to, 0.0),
            predictor.collides(shift(from), &moved, shift(to), 0.0)
        );
    }

    #[test]
    fn test_starting_inside_radius_always_collides(
        from in arb_point(),
        to in arb_point(),
        velocity in arb_velocity(540.0),
        angle in 0usize..360,
        distance in 0.0f64..499.0
    ) {
        let predictor = CollisionPredictor::from_config(&EngineConfig::default());
        let offset = Vector2D::new(1.0, 0.0).rotate(angle as f64).scaled(distance);
        let position = from + offset;
        let monster = Creature::new(1, -1, Category::Monster).with_state(position, velocity);

        prop_assume!(from.distance_to(&position) <= 500.0);
        prop_assert!(predictor.collides(from, &monster, to, 0.0));
    }

    #[test]
    fn test_escape_stays_on_map(
        from in arb_point(),
        goal in arb_point(),
        monsters in prop::collection::vec(arb_monster(), 0..3)
    ) {
        let config = EngineConfig { lookahead_step_deg: 30, ..EngineConfig::default() };
        let planner = EscapePlanner::new(&config, Box::new(PursuitMotion::new(540.0)));

        let escape = planner.find_safe_path(from, &monsters, goal);
        prop_assert!(escape.is_on_map(config.map_size), "escape {} left the map", escape);
        prop_assert!(from.distance_to(&escape) <= 601.0);
    }

    #[test]
    fn test_located_region_contains_true_position(
        fish in arb_fish(),
        observers in prop::collection::vec(arb_point(), 1..8)
    ) {
        let config = EngineConfig::default();
        let mut log = RadarLog::new(observers.len());
        for (drone_id, observer) in observers.iter().enumerate() {
            let quadrant = Quadrant::observe(*observer, fish.position, config.sensor_margin);
            if quadrant != Quadrant::Unknown {
                log.register_bearing(fish.id, Bearing {
                    drone_id: drone_id as u32,
                    observer: *observer,
                    quadrant,
                    turn: 10,
                });
            }
        }

        let region = locate(&fish, &log, 10, &config);
        prop_assert!(
            region.contains(fish.position),
            "{:?} does not contain {}", region, fish.position
        );
    }

    #[test]
    fn test_moving_fish_stays_inside_located_region(
        fish in arb_fish(),
        velocity in arb_fish_velocity(),
        observers in prop::collection::vec(arb_point(), 1..8),
        sighted in any::<bool>()
    ) {
        let config = EngineConfig::default();
        let band = fish.level().depth_band();
        let mut log = RadarLog::new(config.bearing_capacity);
        let mut position = fish.position;
        let step = velocity.rounded();

        if sighted {
            log.register_sighting(fish.id, Sighting { position, velocity: step, turn: 1 });
        }

        // 各ターン方位を記録してから魚を1ターン進める
        for (index, observer) in observers.iter().enumerate() {
            let turn = index as u32 + 1;
            let quadrant = Quadrant::observe(*observer, position, config.sensor_margin);
            if quadrant != Quadrant::Unknown {
                log.register_bearing(fish.id, Bearing {
                    drone_id: index as u32 % 2,
                    observer: *observer,
                    quadrant,
                    turn,
                });
            }
            let next = position + step;
            position = Point::new(next.x.clamp(0, config.map_size), band.clamp(next.y));
        }

        let now = observers.len() as u32 + 1;
        let believed = fish.clone().with_state(fish.position, step);
        let region = locate(&believed, &log, now, &config);
        prop_assert!(
            region.contains(position),
            "{:?} does not contain {} at turn {}", region, position, now
        );
    }
}
