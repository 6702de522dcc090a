use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use bevy_math::{IVec2, Quat, Vec3};
use shapeshift::prelude::*;
use test_log::test;

use crate::protocol::*;

fn rig(target: &Handle, attachment: &Handle) -> Rig {
    let registry = registry(DeserializeConfig::default());
    let mut rig = Rig {
        label: "crane".into(),
        position: Vec3::new(1.0, -2.0, 3.5),
        rotation: Quat::from_rotation_z(1.2),
        tint: Color32::new(255, 128, 0, 200),
        spare: Child {
            time: 3,
            timer: 1,
            target: Some(target.clone()),
        },
        tickers: vec![
            Box::new(Child {
                time: 1,
                timer: 0,
                target: None,
            }),
            Box::new(GrandChild {
                base: Child {
                    time: 8,
                    timer: 6,
                    target: Some(target.clone()),
                },
                name: "hook".into(),
            }),
            Box::new(Child::default()),
        ],
        waypoints: vec![IVec2::new(0, 0), IVec2::new(4, -9)],
        attachments: vec![Some(attachment.clone()), None, Some(target.clone())],
        ..Default::default()
    };
    rig.ticker.substitute(&registry, "GrandChild").unwrap();
    *downcast_mut::<GrandChild, _>(rig.ticker.value_mut()).unwrap() = GrandChild {
        base: Child {
            time: 5,
            timer: 5,
            target: Some(attachment.clone()),
        },
        name: "boom".into(),
    };
    rig
}

#[test]
fn test_round_trip_with_mixed_variants() {
    let registry = registry(DeserializeConfig::default());
    let channel = ReferenceChannel::direct();
    let target = scene_object("target");
    let attachment = scene_object("attachment");
    let rig = rig(&target, &attachment);

    let mut buffer = to_buffer(&rig, &channel).unwrap();
    let mut read = Rig::default();
    let unresolved = from_buffer(&mut read, &mut buffer, &registry, &channel).unwrap();
    assert!(unresolved.is_empty());
    assert_eq!(read, rig);

    let names: Vec<_> = read.tickers.iter().map(|t| t.type_name()).collect();
    assert_eq!(names, vec!["Child", "GrandChild", "Child"]);
    assert_eq!(read.ticker.type_identifier(), "GrandChild");
    // handles point to the very same host objects
    assert_eq!(
        read.spare.target.as_ref().and_then(|h| h.downcast_ref::<SceneObject>()),
        Some(&SceneObject { name: "target" })
    );
}

#[test]
fn test_round_trip_through_interface() {
    let registry = registry(DeserializeConfig::default());
    let channel = ReferenceChannel::direct();
    let rig: Box<dyn Entity> = Box::new(rig(&scene_object("a"), &scene_object("b")));

    let envelope = Envelope::record(&*rig, &channel).unwrap();
    assert_eq!(envelope.type_name(), "Rig");
    let read = envelope
        .instantiate::<dyn Entity>(&registry, &channel, || Box::new(Mount::default()))
        .unwrap()
        .value;
    assert_eq!(
        downcast_ref::<Rig, _>(&*read),
        downcast_ref::<Rig, _>(&*rig)
    );
}

#[test]
fn test_reconstructed_entities_behave() {
    let registry = registry(DeserializeConfig::default());
    let channel = ReferenceChannel::direct();
    let rig = rig(&scene_object("a"), &scene_object("b"));
    let mut read = Rig::default();
    from_buffer(&mut read, &mut to_buffer(&rig, &channel).unwrap(), &registry, &channel).unwrap();

    // the grandchild runs its own timer: 5 -> 3 -> 1 -> elapsed
    let ticker = read.ticker.value_mut();
    assert_eq!(ticker.tick(), None);
    assert_eq!(ticker.tick(), None);
    assert_eq!(ticker.tick(), Some(Vec3::ONE * 3.0));
}

/// Writes the fields of a [`Mount`] in the wrong order
#[derive(Debug, Default)]
struct ReorderedMount(Mount);

impl Entity for ReorderedMount {
    fn serialize(&self, ctx: &mut SerializeContext) -> Result<()> {
        ctx.write(&self.0.checksum)?;
        ctx.write_entity(&self.0.child)?;
        ctx.write(&self.0.slot)
    }

    fn init(&mut self, _: &mut DeserializeContext) -> Result<()> {
        unreachable!()
    }
}

#[test]
fn test_field_order_mismatch_is_detected() {
    let registry = registry(DeserializeConfig::default());
    let channel = ReferenceChannel::direct();
    let written = ReorderedMount(Mount {
        slot: 2,
        child: Child::default(),
        // the upper half is read back as the nested frame length
        checksum: 0x0000_1000_0000_0007,
    });
    let mut buffer = to_buffer(&written, &channel).unwrap();

    let mut read = Mount::default();
    assert!(matches!(
        from_buffer(&mut read, &mut buffer, &registry, &channel),
        Err(EntityError::Serialization(SerializationError::BufferUnderrun { requested: 0x1000, .. }))
    ));
}

#[test]
fn test_truncated_payload_fails() {
    let registry = registry(DeserializeConfig::default());
    let channel = ReferenceChannel::direct();
    let rig = rig(&scene_object("a"), &scene_object("b"));
    let (bytes, groups) = to_buffer(&rig, &channel).unwrap().into_parts();

    let mut truncated = Buffer::from_parts(bytes.slice(..bytes.len() - 3), groups);
    let mut read = Rig::default();
    assert!(matches!(
        from_buffer(&mut read, &mut truncated, &registry, &channel),
        Err(EntityError::Serialization(SerializationError::BufferUnderrun { .. }))
    ));
}

#[test]
fn test_skip_nested_entity() {
    let registry = registry(DeserializeConfig::default());
    let channel = ReferenceChannel::direct();
    let mount = Mount {
        slot: 9,
        child: Child {
            time: 100,
            timer: 50,
            target: Some(scene_object("arm")),
        },
        checksum: 0xfeed_beef,
    };
    let mut buffer = to_buffer(&mount, &channel).unwrap();

    let mut ctx = DeserializeContext::new(&mut buffer, &registry, &channel);
    assert_eq!(ctx.read::<u32>().unwrap(), 9);
    // two i32 and a one-byte tag with an i32 group index
    assert_eq!(ctx.skip_entity().unwrap(), 4 + 4 + 1 + 4);
    assert_eq!(ctx.read::<u64>().unwrap(), 0xfeed_beef);
    assert_eq!(buffer.unread_len(), 0);
}

#[test]
fn test_skip_polymorphic_entity() {
    let registry = registry(DeserializeConfig::default());
    let channel = ReferenceChannel::direct();
    let rig = rig(&scene_object("a"), &scene_object("b"));
    let mut buffer = to_buffer(&rig, &channel).unwrap();

    let mut ctx = DeserializeContext::new(&mut buffer, &registry, &channel);
    assert_eq!(ctx.read::<String>().unwrap(), "crane");
    ctx.read::<Vec3>().unwrap();
    ctx.read::<Quat>().unwrap();
    ctx.read::<Color32>().unwrap();
    ctx.skip_polymorphic().unwrap();
    let spare = ctx.read_entity::<Child>().unwrap();
    assert_eq!(spare, rig.spare);
}
