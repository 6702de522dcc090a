use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use shapeshift::prelude::*;
use test_log::test;

use crate::protocol::*;

fn rig_with_attachments(attachments: Vec<Option<Handle>>, spare: Option<Handle>) -> Rig {
    Rig {
        label: "loader".into(),
        spare: Child {
            time: 2,
            timer: 2,
            target: spare,
        },
        waypoints: vec![bevy_math::IVec2::new(3, 3)],
        attachments,
        ..Default::default()
    }
}

#[test]
fn test_identifier_round_trip() {
    let a = scene_object("a");
    let b = scene_object("b");
    let channel = ReferenceChannel::identifier(scene(&[a.clone(), b.clone()]));
    let rig = rig_with_attachments(vec![Some(b.clone()), None, Some(a.clone())], Some(a.clone()));

    let buffer = to_buffer(&rig, &channel).unwrap();
    assert!(buffer.handle_groups().is_empty());

    // only the bytes travel
    let mut received = Buffer::from_parts(buffer.to_bytes(), Vec::new());
    let registry = registry(DeserializeConfig::default());
    let mut read = Rig::default();
    let unresolved = from_buffer(&mut read, &mut received, &registry, &channel).unwrap();
    assert!(unresolved.is_empty());
    assert_eq!(read, rig);
    assert!(read.attachments[0].as_ref().unwrap().ptr_eq(&b));
}

#[test]
fn test_identifier_miss_reads_absent_and_continues() {
    let a = scene_object("a");
    let b = scene_object("b");
    let writer = ReferenceChannel::identifier(scene(&[a.clone(), b.clone()]));
    let rig = rig_with_attachments(vec![Some(b.clone()), None, Some(a.clone())], Some(b));
    let bytes = to_buffer(&rig, &writer).unwrap().to_bytes();

    // the reader only knows the object at slot 0
    let reader = ReferenceChannel::identifier(scene(&[a.clone()]));
    let registry = registry(DeserializeConfig::default());
    let mut read = Rig::default();
    let unresolved = from_buffer(
        &mut read,
        &mut Buffer::from_parts(bytes, Vec::new()),
        &registry,
        &reader,
    )
    .unwrap();

    assert_eq!(
        unresolved,
        vec![
            UnresolvedReference {
                id: ObjectId::new("scene", 1)
            };
            2
        ]
    );
    assert_eq!(read.spare.target, None);
    assert_eq!(read.attachments, vec![None, None, Some(a)]);
    // fields after the misses are still read
    assert_eq!(read.label, "loader");
    assert_eq!(read.waypoints, rig.waypoints);
}

#[test]
fn test_undescribed_handle_is_sent_absent() {
    let known = scene_object("known");
    let stranger = scene_object("stranger");
    let channel = ReferenceChannel::identifier(scene(&[known.clone()]));
    let child = Child {
        time: 1,
        timer: 1,
        target: Some(stranger),
    };

    let mut buffer = to_buffer(&child, &channel).unwrap();
    let registry = registry(DeserializeConfig::default());
    let mut read = Child::default();
    let unresolved = from_buffer(&mut read, &mut buffer, &registry, &channel).unwrap();
    assert!(unresolved.is_empty());
    assert_eq!(read.target, None);
    assert_eq!(read.time, 1);
}

#[test]
fn test_mode_switch_between_writes() {
    let target = scene_object("target");
    let table = scene(&[target.clone()]);
    let mut channel = ReferenceChannel::direct().with_resolver(table);
    let child = Child {
        time: 6,
        timer: 3,
        target: Some(target.clone()),
    };

    let mut buffer = Buffer::new();
    SerializeContext::new(&mut buffer, &channel)
        .write_entity(&child)
        .unwrap();
    channel.set_mode(ReferenceMode::Identifier);
    SerializeContext::new(&mut buffer, &channel)
        .write_entity(&child)
        .unwrap();
    // only the direct record used a handle group
    assert_eq!(buffer.handle_groups().len(), 1);

    let registry = registry(DeserializeConfig::default());
    let mut ctx = DeserializeContext::new(&mut buffer, &registry, &channel);
    assert_eq!(ctx.read_entity::<Child>().unwrap(), child);
    assert_eq!(ctx.read_entity::<Child>().unwrap(), child);
    assert!(ctx.unresolved().is_empty());
}

#[test]
fn test_direct_records_need_their_handle_groups() {
    let channel = ReferenceChannel::direct();
    let child = Child {
        time: 1,
        timer: 0,
        target: Some(scene_object("local")),
    };
    let bytes = to_buffer(&child, &channel).unwrap().to_bytes();

    let registry = registry(DeserializeConfig::default());
    let mut read = Child::default();
    assert_eq!(
        from_buffer(
            &mut read,
            &mut Buffer::from_parts(bytes, Vec::new()),
            &registry,
            &channel
        ),
        Err(EntityError::Serialization(SerializationError::HandleUnderrun {
            index: 0,
            available: 0
        }))
    );
}

#[test]
fn test_envelope_relink() {
    let a = scene_object("a");
    let b = scene_object("b");
    let channel = ReferenceChannel::direct().with_resolver(scene(&[a.clone(), b.clone()]));
    let rig = rig_with_attachments(vec![Some(a), Some(b)], None);
    let mut envelope = Envelope::record(&rig, &channel).unwrap();
    assert!(envelope.identifiers().is_some());

    // the objects were rebuilt by the host, and the second one is gone
    let rebuilt = scene_object("a");
    let host: Arc<ObjectTable> = scene(&[rebuilt.clone()]);
    let unresolved = envelope.relink(&*host);
    assert_eq!(
        unresolved,
        vec![UnresolvedReference {
            id: ObjectId::new("scene", 1)
        }]
    );

    let registry = registry(DeserializeConfig::default());
    let read = envelope
        .instantiate::<dyn Entity>(&registry, &ReferenceChannel::direct(), || {
            Box::new(Rig::default())
        })
        .unwrap()
        .value;
    let read = downcast_ref::<Rig, _>(&*read).unwrap();
    assert_eq!(read.attachments, vec![Some(rebuilt), None]);
    assert_eq!(read.label, "loader");
}
