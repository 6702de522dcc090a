//! Entities and host objects shared by the integration tests.
use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use bevy_math::{IVec2, Quat, Vec3};
use shapeshift::prelude::*;
use tracing::debug;

/// A host-owned object, only ever referenced through a [`Handle`]
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub name: &'static str,
}

/// Interface of the polymorphic fields of the test protocol
pub trait Ticker: Entity {
    /// Advance one step, returning the translation to apply to the target, if any
    fn tick(&mut self) -> Option<Vec3>;

    fn eq_ticker(&self, other: &dyn Ticker) -> bool;
}

impl PartialEq for dyn Ticker {
    fn eq(&self, other: &Self) -> bool {
        self.eq_ticker(other)
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Child {
    pub time: i32,
    pub timer: i32,
    pub target: Option<Handle>,
}

impl Entity for Child {
    fn type_name(&self) -> &'static str {
        "Child"
    }

    fn serialize(&self, ctx: &mut SerializeContext) -> Result<()> {
        ctx.write(&self.time)?;
        ctx.write(&self.timer)?;
        ctx.write_handle(self.target.as_ref())
    }

    fn init(&mut self, ctx: &mut DeserializeContext) -> Result<()> {
        self.time = ctx.read()?;
        self.timer = ctx.read()?;
        self.target = ctx.read_handle()?;
        Ok(())
    }
}

impl Ticker for Child {
    fn tick(&mut self) -> Option<Vec3> {
        if self.timer <= 0 {
            debug!("child timer restarted");
            self.timer = self.time;
            return None;
        }
        self.timer -= 1;
        if self.timer > 0 {
            return None;
        }
        self.timer = self.time;
        self.target.as_ref().map(|_| Vec3::ONE)
    }

    fn eq_ticker(&self, other: &dyn Ticker) -> bool {
        downcast_ref::<Self, _>(other) == Some(self)
    }
}

/// Extends [`Child`] with a name and a faster timer
#[derive(Debug, Default, Clone, PartialEq)]
pub struct GrandChild {
    pub base: Child,
    pub name: String,
}

impl Entity for GrandChild {
    fn type_name(&self) -> &'static str {
        "GrandChild"
    }

    fn serialize(&self, ctx: &mut SerializeContext) -> Result<()> {
        self.base.serialize(ctx)?;
        ctx.write(&self.name)
    }

    fn init(&mut self, ctx: &mut DeserializeContext) -> Result<()> {
        self.base.init(ctx)?;
        self.name = ctx.read()?;
        Ok(())
    }
}

impl Ticker for GrandChild {
    fn tick(&mut self) -> Option<Vec3> {
        self.base.timer -= 2;
        if self.base.timer > 0 {
            return None;
        }
        self.base.timer = self.base.time;
        self.base.target.as_ref().map(|_| Vec3::ONE * 3.0)
    }

    fn eq_ticker(&self, other: &dyn Ticker) -> bool {
        downcast_ref::<Self, _>(other) == Some(self)
    }
}

/// Declared type of every [`Ticker`] field
pub fn default_ticker() -> Box<dyn Ticker> {
    Box::new(Child::default())
}

/// An entity using every kind of field
#[derive(Debug)]
pub struct Rig {
    pub label: String,
    pub position: Vec3,
    pub rotation: Quat,
    pub tint: Color32,
    pub ticker: Polymorph<dyn Ticker>,
    pub spare: Child,
    pub tickers: Vec<Box<dyn Ticker>>,
    pub waypoints: Vec<IVec2>,
    pub attachments: Vec<Option<Handle>>,
}

impl Default for Rig {
    fn default() -> Self {
        Self {
            label: String::new(),
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            tint: Color32::default(),
            ticker: Polymorph::new(default_ticker),
            spare: Child::default(),
            tickers: Vec::new(),
            waypoints: Vec::new(),
            attachments: Vec::new(),
        }
    }
}

impl PartialEq for Rig {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label
            && self.position == other.position
            && self.rotation == other.rotation
            && self.tint == other.tint
            && self.ticker.type_identifier() == other.ticker.type_identifier()
            && self.ticker.value() == other.ticker.value()
            && self.spare == other.spare
            && self.tickers == other.tickers
            && self.waypoints == other.waypoints
            && self.attachments == other.attachments
    }
}

impl Entity for Rig {
    fn type_name(&self) -> &'static str {
        "Rig"
    }

    fn serialize(&self, ctx: &mut SerializeContext) -> Result<()> {
        ctx.write(&self.label)?;
        ctx.write(&self.position)?;
        ctx.write(&self.rotation)?;
        ctx.write(&self.tint)?;
        self.ticker.serialize(ctx)?;
        ctx.write_entity(&self.spare)?;
        ctx.write_entities(&self.tickers)?;
        ctx.write(&self.waypoints)?;
        ctx.write_handles(&self.attachments)
    }

    fn init(&mut self, ctx: &mut DeserializeContext) -> Result<()> {
        self.label = ctx.read()?;
        self.position = ctx.read()?;
        self.rotation = ctx.read()?;
        self.tint = ctx.read()?;
        self.ticker.init(ctx)?;
        ctx.init_entity(&mut self.spare)?;
        self.tickers = ctx.read_entities(default_ticker)?;
        self.waypoints = ctx.read()?;
        self.attachments = ctx.read_handles()?;
        Ok(())
    }
}

/// A nested entity between two fixed-width fields
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Mount {
    pub slot: u32,
    pub child: Child,
    pub checksum: u64,
}

impl Entity for Mount {
    fn type_name(&self) -> &'static str {
        "Mount"
    }

    fn serialize(&self, ctx: &mut SerializeContext) -> Result<()> {
        ctx.write(&self.slot)?;
        ctx.write_entity(&self.child)?;
        ctx.write(&self.checksum)
    }

    fn init(&mut self, ctx: &mut DeserializeContext) -> Result<()> {
        self.slot = ctx.read()?;
        ctx.init_entity(&mut self.child)?;
        self.checksum = ctx.read()?;
        Ok(())
    }
}

pub fn registry(config: DeserializeConfig) -> EntityRegistry {
    let mut registry = EntityRegistry::new(config);
    registry.add::<dyn Ticker>(|| Box::new(Child::default())).unwrap();
    registry.add::<dyn Ticker>(|| Box::new(GrandChild::default())).unwrap();
    registry.add::<dyn Entity>(|| Box::new(Rig::default())).unwrap();
    registry.add::<dyn Entity>(|| Box::new(Mount::default())).unwrap();
    registry.add::<dyn Entity>(|| Box::new(Child::default())).unwrap();
    registry.validate().unwrap();
    registry
}

/// Host table holding `objects`, all in the container `scene`, at slots 0, 1, 2...
pub fn scene(objects: &[Handle]) -> Arc<ObjectTable> {
    let mut table = ObjectTable::new();
    for (slot, handle) in (0i64..).zip(objects) {
        table.insert("scene", slot, handle.clone());
    }
    Arc::new(table)
}

pub fn scene_object(name: &'static str) -> Handle {
    Handle::new(SceneObject { name })
}
