use std::collections::{HashMap, VecDeque};

use glam::DMat4;

use crate::scene::{InstanceMode, Object, Scene};

/// One enumerated object together with its accumulated page-space matrix.
#[derive(Clone, Copy, Debug)]
pub struct PlacedObject<'a> {
    pub object: &'a Object,
    pub matrix: DMat4,
}

/// Iterator over every drawable placement in a scene and its background chain.
///
/// Objects come out in scene order, primary scene first, then each background
/// scene in chain order. An object whose parent instances its children is
/// skipped entirely (it reaches the page through the parent's instance list);
/// an instancing object yields all of its instances before itself. Dangling
/// name references are logged and skipped, never fatal.
pub struct SceneObjects<'a> {
    view: DMat4,
    scenes: Vec<&'a Scene>,
    scene_index: usize,
    object_index: usize,
    names: HashMap<&'a str, &'a Object>,
    pending: VecDeque<PlacedObject<'a>>,
}

impl<'a> SceneObjects<'a> {
    pub fn new(scene: &'a Scene, view: DMat4) -> Self {
        // The chain is owned data, so it is finite and resolved up front.
        let mut scenes = Vec::new();
        let mut next = Some(scene);
        while let Some(s) = next {
            scenes.push(s);
            next = s.background.as_deref();
        }
        Self {
            view,
            scenes,
            scene_index: 0,
            object_index: 0,
            names: index_names(scene),
            pending: VecDeque::new(),
        }
    }

    fn enqueue(&mut self, object: &'a Object) {
        if let Some(parent_name) = &object.parent {
            match self.names.get(parent_name.as_str()).copied() {
                Some(parent) if parent.instancing != InstanceMode::None => return,
                Some(_) => {}
                None => {
                    tracing::warn!(
                        "object '{}' references missing parent '{}'; drawing it directly",
                        object.name,
                        parent_name
                    );
                }
            }
        }
        if object.instancing != InstanceMode::None {
            for instance in &object.instances {
                match self.names.get(instance.object.as_str()).copied() {
                    Some(target) => self.pending.push_back(PlacedObject {
                        object: target,
                        matrix: self.view * instance.matrix,
                    }),
                    None => tracing::warn!(
                        "instance target '{}' on '{}' not found; skipping",
                        instance.object,
                        object.name
                    ),
                }
            }
        }
        self.pending.push_back(PlacedObject {
            object,
            matrix: self.view * object.matrix_world,
        });
    }
}

impl<'a> Iterator for SceneObjects<'a> {
    type Item = PlacedObject<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Some(item);
            }
            let scene = self.scenes.get(self.scene_index).copied()?;
            match scene.objects.get(self.object_index) {
                Some(object) => {
                    self.object_index += 1;
                    self.enqueue(object);
                }
                None => {
                    self.scene_index += 1;
                    self.object_index = 0;
                    if let Some(next_scene) = self.scenes.get(self.scene_index).copied() {
                        self.names = index_names(next_scene);
                    }
                }
            }
        }
    }
}

fn index_names(scene: &Scene) -> HashMap<&str, &Object> {
    scene
        .objects
        .iter()
        .map(|object| (object.name.as_str(), object))
        .collect()
}
