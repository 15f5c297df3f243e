//! Demonstrates pooling of short-lived scene objects with `warm_pool`.
//!
//! Run with `RUST_LOG=warm_pool=trace` to see the pool lifecycle events.

use std::cell::Cell;
use std::rc::Rc;

use tracing_subscriber::EnvFilter;
use warm_pool::{Host, LifecycleEvent, PoolRegistry};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
enum Prefab {
    Projectile,
    Explosion,
}

#[derive(Debug)]
struct SceneObject {
    name: String,
    visible: bool,
    parent: Option<&'static str>,
}

#[derive(Debug, Default)]
struct Scene {
    spawned: Cell<usize>,
    despawned: Cell<usize>,
}

impl Host for Scene {
    type Prototype = Prefab;
    type Object = SceneObject;
    type Container = &'static str;

    fn instantiate(&self, prototype: &Prefab) -> SceneObject {
        self.spawned.set(self.spawned.get().wrapping_add(1));

        SceneObject {
            name: format!("{prototype:?} #{}", self.spawned.get()),
            visible: true,
            parent: None,
        }
    }

    fn destroy(&self, object: SceneObject) {
        self.despawned.set(self.despawned.get().wrapping_add(1));
        println!("destroyed {}", object.name);
    }

    fn notify(&self, object: &mut SceneObject, event: LifecycleEvent) {
        object.visible = event == LifecycleEvent::Wake;
    }

    fn attach(&self, object: &mut SceneObject, container: &&'static str) {
        object.parent = Some(*container);
    }

    fn detach(&self, object: &mut SceneObject) {
        object.parent = None;
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let scene = Rc::new(Scene::default());

    let mut registry = PoolRegistry::builder(Rc::clone(&scene))
        .container("pooled")
        .prewarm(Prefab::Projectile, 8)
        .build();

    // Registration on demand is idempotent, so every use site may ensure it.
    _ = registry.register_prototype(Prefab::Explosion, 2);
    _ = registry.register_prototype(Prefab::Projectile, 8);

    for frame in 0..3 {
        let volley = (0..10)
            .map(|_| registry.lend(&Prefab::Projectile))
            .collect::<Result<Vec<_>, _>>()
            .expect("projectiles are registered");

        let boom = registry
            .lend(&Prefab::Explosion)
            .expect("explosions are registered");

        println!(
            "frame {frame}: {} projectiles in flight, {} visible, explosion {} under {:?}",
            volley.len(),
            volley.iter().filter(|p| p.visible).count(),
            boom.name,
            boom.parent,
        );

        for projectile in volley {
            projectile.release();
        }

        registry
            .reclaim(boom)
            .expect("explosion belongs to this registry");
    }

    println!(
        "spawned {} objects over three frames of 11 objects each",
        scene.spawned.get()
    );

    registry.teardown();

    println!("destroyed {} objects on teardown", scene.despawned.get());
}
