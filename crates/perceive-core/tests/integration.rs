//! Integration tests exercising the full perception loop:
//! register → feed transforms → tick → memory and callbacks.

use std::cell::RefCell;
use std::rc::Rc;

use perceive_core::{
    Awareness, LineOfSight, RayHit, SenseLink, Sensor, SensorManager, Signal, SpatialQuery,
    ViewCone, Vec3,
};

type Fired = Rc<RefCell<Vec<SenseLink>>>;

fn recorder() -> (Fired, impl Fn(&SenseLink) + 'static) {
    let fired: Fired = Rc::default();
    let log = fired.clone();
    (fired, move |link: &SenseLink| log.borrow_mut().push(link.clone()))
}

/// Colliders on the +Z axis: each entry is the z of an object, hit in order
/// of distance when the ray points forward.
struct AxisColliders(Vec<f32>);

impl SpatialQuery for AxisColliders {
    fn raycast_all(&self, origin: Vec3, direction: Vec3) -> Vec<RayHit> {
        if direction.z <= 0.0 {
            return Vec::new();
        }
        let mut hits: Vec<RayHit> = self
            .0
            .iter()
            .filter(|&&z| z > origin.z)
            .map(|&z| RayHit {
                position: Vec3::new(0.0, 0.0, z),
                distance: z - origin.z,
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

/// One Vision sensor (cooldown 3s, one 60° cone of range 5 at Medium, no
/// line-of-sight check). A signal 2 units ahead is detected once; after it
/// leaves, the belief decays Medium → Low → None over two phases and the
/// callback never fires again.
#[test]
fn detect_then_forget() {
    let (fired, callback) = recorder();
    let mut mgr = SensorManager::default();
    let sensor = mgr.register_sensor(
        Sensor::vision(3.0)
            .with_cone(ViewCone::new(60, 5.0, Awareness::Medium))
            .with_line_of_sight(LineOfSight::NoCheck)
            .on_detected(callback),
    );
    let signal = mgr.register_signal(Signal::visual(Vec3::new(0.0, 0.0, 2.0)));

    mgr.tick(1, 0.0);
    assert_eq!(fired.borrow().len(), 1);
    assert_eq!(fired.borrow()[0].awareness, Awareness::Medium);
    assert!(fired.borrow()[0].first_hand);

    mgr.signal_mut(signal)
        .unwrap()
        .set_position(Vec3::new(0.0, 0.0, 40.0));

    let report = mgr.tick(1, 1.0).unwrap();
    assert_eq!(report.fired(), 0);
    assert_eq!(mgr.link(sensor, signal, true).unwrap().awareness, Awareness::Low);

    mgr.tick(1, 2.0);
    assert_eq!(mgr.link(sensor, signal, true).unwrap().awareness, Awareness::None);

    assert_eq!(fired.borrow().len(), 1, "decay never fires the callback");
}

/// cooldown 3s ⇒ one phase per second: High → Medium → Low → None.
#[test]
fn cooldown_arithmetic() {
    let (_, callback) = recorder();
    let mut mgr = SensorManager::default();
    let sensor = mgr.register_sensor(
        Sensor::vision(3.0)
            .with_cone(ViewCone::new(90, 10.0, Awareness::High))
            .on_detected(callback),
    );
    let signal = mgr.register_signal(Signal::visual(Vec3::new(0.0, 0.0, 4.0)));
    let t = 10.0;
    mgr.tick(1, t);
    mgr.unregister_signal(signal);

    let expected = [Awareness::Medium, Awareness::Low, Awareness::None];
    for (step, want) in expected.into_iter().enumerate() {
        mgr.tick(1, t + (step + 1) as f64);
        assert_eq!(
            mgr.memory(sensor)[0].awareness,
            want,
            "at t+{}",
            step + 1
        );
    }
}

#[test]
fn throttled_tick_runs_on_fifth_call() {
    let (fired, callback) = recorder();
    let mut mgr = SensorManager::default();
    mgr.register_sensor(
        Sensor::vision(3.0)
            .with_cone(ViewCone::new(90, 10.0, Awareness::Low))
            .on_detected(callback),
    );
    mgr.register_signal(Signal::visual(Vec3::new(0.0, 0.0, 4.0)));

    for frame in 0..4 {
        assert!(mgr.tick(5, frame as f64 * 0.016).is_none());
    }
    assert!(fired.borrow().is_empty());
    let report = mgr.tick(5, 0.064).expect("fifth call is live");
    assert_eq!(report.evaluated, 1);
    assert_eq!(mgr.live_ticks(), 1);
}

#[test]
fn registering_twice_is_refused() {
    let mut mgr = SensorManager::default();
    let sensor = Sensor::vision(2.0).with_cone(ViewCone::new(90, 10.0, Awareness::Low));
    let first = mgr.register_sensor(sensor.clone());
    let second = mgr.register_sensor(sensor);
    assert_eq!(first.0, 0);
    assert_eq!(second.0, -1);
    assert_eq!(mgr.sensor_count(), 1);
}

#[test]
fn cone_geometry_edge_cases() {
    let cone = ViewCone::new(90, 10.0, Awareness::Medium);
    let diagonal = Signal::visual(Vec3::new(5.0, 0.0, 5.0));
    let side = Signal::visual(Vec3::new(10.0, 0.0, 0.0));
    assert_eq!(cone.evaluate_signal(Vec3::ZERO, Vec3::FORWARD, &diagonal), Awareness::Medium);
    assert_eq!(cone.evaluate_signal(Vec3::ZERO, Vec3::FORWARD, &side), Awareness::None);
}

#[test]
fn peripheral_and_central_vision() {
    let (fired, callback) = recorder();
    let mut mgr = SensorManager::default();
    let sensor = mgr.register_sensor(
        Sensor::vision(6.0)
            .with_cone(ViewCone::new(160, 6.0, Awareness::Low))
            .with_cone(ViewCone::new(40, 12.0, Awareness::High))
            .on_detected(callback),
    );
    let intruder = mgr.register_signal(Signal::visual(Vec3::new(4.0, 0.0, 1.0)));

    mgr.tick(1, 0.0);
    assert_eq!(mgr.alertness(sensor), Awareness::Low);

    // Guard turns to face the intruder
    mgr.sensor_mut(sensor)
        .unwrap()
        .set_transform(Vec3::ZERO, Vec3::new(4.0, 0.0, 1.0).normalize());
    mgr.tick(1, 0.2);
    assert_eq!(mgr.alertness(sensor), Awareness::High);

    let levels: Vec<Awareness> = fired.borrow().iter().map(|l| l.awareness).collect();
    assert_eq!(levels, vec![Awareness::Low, Awareness::High]);
    assert!(fired.borrow().iter().all(|l| l.signal == intruder));
}

#[test]
fn single_raycast_blocked_by_wall_complete_raycast_is_not() {
    let world = Rc::new(AxisColliders(vec![3.0, 6.0]));
    let target = Vec3::new(0.0, 0.0, 6.0);

    for (los, expect_seen) in [
        (LineOfSight::SingleRaycast(world.clone()), false),
        (LineOfSight::CompleteRaycast(world.clone()), true),
        (LineOfSight::NoCheck, true),
    ] {
        let (fired, callback) = recorder();
        let mut mgr = SensorManager::default();
        mgr.register_sensor(
            Sensor::vision(3.0)
                .with_cone(ViewCone::new(60, 10.0, Awareness::Medium))
                .with_line_of_sight(los)
                .on_detected(callback),
        );
        mgr.register_signal(Signal::visual(target));
        mgr.tick(1, 0.0);
        assert_eq!(!fired.borrow().is_empty(), expect_seen);
    }
}

#[test]
fn single_raycast_sees_unobstructed_target() {
    let world = Rc::new(AxisColliders(vec![4.0, 8.0]));
    let (fired, callback) = recorder();
    let mut mgr = SensorManager::default();
    mgr.register_sensor(
        Sensor::vision(3.0)
            .with_cone(ViewCone::new(60, 10.0, Awareness::Medium))
            .with_line_of_sight(LineOfSight::SingleRaycast(world))
            .on_detected(callback),
    );
    mgr.register_signal(Signal::visual(Vec3::new(0.0, 0.0, 4.0)));
    mgr.tick(1, 0.0);
    assert_eq!(fired.borrow().len(), 1);
}

#[test]
fn hearing_placeholder_hears_everything_at_low() {
    let (fired, callback) = recorder();
    let mut mgr = SensorManager::default();
    let sensor = mgr.register_sensor(Sensor::hearing(2.0).on_detected(callback));
    mgr.register_signal(Signal::audio(3.0, true).with_position(Vec3::new(50.0, 0.0, -50.0)));

    mgr.tick(1, 0.0);
    mgr.tick(1, 0.1);
    assert_eq!(fired.borrow().len(), 1);
    assert_eq!(mgr.alertness(sensor), Awareness::Low);
}

#[test]
fn many_sensors_many_signals() {
    let (fired, callback) = recorder();
    let callback = Rc::new(callback);
    let mut mgr = SensorManager::default();
    for i in 0..4 {
        let cb = callback.clone();
        mgr.register_sensor(
            Sensor::vision(3.0)
                .with_transform(Vec3::new(i as f32 * 20.0, 0.0, 0.0), Vec3::FORWARD)
                .with_cone(ViewCone::new(90, 8.0, Awareness::Medium))
                .on_detected(move |l| cb(l)),
        );
    }
    // One signal in front of each even-indexed sensor
    for i in [0, 2] {
        mgr.register_signal(Signal::visual(Vec3::new(i as f32 * 20.0, 0.0, 3.0)));
    }
    let report = mgr.tick(1, 0.0).unwrap();
    assert_eq!(report.evaluated, 8);
    assert_eq!(report.new, 2);
    assert_eq!(fired.borrow().len(), 2);
}

/// A host-side entity owning a sensor. Once the entity is dropped, the
/// sensor disappears from the manager at the next evaluation.
#[test]
fn sensor_follows_its_owner() {
    struct Guard {
        name: &'static str,
    }

    let (fired, callback) = recorder();
    let guard = Rc::new(Guard { name: "gate" });
    let mut sensor = Sensor::vision(3.0)
        .with_cone(ViewCone::new(90, 10.0, Awareness::Medium))
        .on_detected(callback);
    sensor.bind_owner(&guard);

    let mut mgr = SensorManager::default();
    let handle = mgr.register_sensor(sensor);
    mgr.register_signal(Signal::visual(Vec3::new(0.0, 0.0, 4.0)));

    mgr.tick(1, 0.0);
    assert_eq!(guard.name, "gate");
    assert_eq!(fired.borrow().len(), 1);

    drop(guard);
    mgr.tick(1, 0.1);
    assert_eq!(mgr.sensor_count(), 0);
    assert!(mgr.sensor(handle).is_none());
    assert!(mgr.memory(handle).is_empty());
    assert_eq!(fired.borrow().len(), 1);
}
