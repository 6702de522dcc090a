use alloc::boxed::Box;
use alloc::string::ToString;
use alloc::vec;
use alloc::vec::Vec;
use shapeshift::prelude::*;
use test_log::test;

use crate::protocol::*;

#[test]
fn test_empty_identifier_falls_back_to_declared() {
    let registry = registry(DeserializeConfig::default());
    let channel = ReferenceChannel::direct();
    let recorded = GrandChild {
        base: Child {
            time: 4,
            timer: 2,
            target: None,
        },
        name: "stale".into(),
    };
    let payload = to_buffer(&recorded, &channel).unwrap();

    // the payload of a previous substitution is ignored
    let envelope = Envelope::new("", payload);
    let value = envelope
        .instantiate(&registry, &channel, default_ticker)
        .unwrap()
        .value;
    assert_eq!(value.type_name(), "Child");
    assert_eq!(downcast_ref::<Child, _>(&*value), Some(&Child::default()));
}

#[test]
fn test_unsubstituted_field_restores_declared() {
    let registry = registry(DeserializeConfig::default());
    let channel = ReferenceChannel::direct();
    let mut ticker = Polymorph::<dyn Ticker>::new(default_ticker);
    ticker.substitute(&registry, "GrandChild").unwrap();
    ticker.clear_substitution();

    let envelope = ticker.record(&channel).unwrap();
    assert!(envelope.is_declared());
    ticker.restore(&registry, &channel).unwrap();
    assert_eq!(ticker.value(), &*default_ticker());
}

#[test]
fn test_unknown_identifier() {
    let registry = registry(DeserializeConfig::default());
    let channel = ReferenceChannel::direct();
    let mut ticker = Polymorph::<dyn Ticker>::new(default_ticker);
    ticker.substitute(&registry, "GrandChild").unwrap();
    let payload = ticker.record(&channel).unwrap().payload().clone();

    ticker.set_envelope(Envelope::new("d41d8cd98f00b204", payload));
    assert_eq!(
        ticker.restore(&registry, &channel),
        Err(EntityError::UnknownType("d41d8cd98f00b204".to_string()))
    );
    // nothing was built: the previous value is still there
    assert_eq!(ticker.type_identifier(), "GrandChild");
    assert_eq!(ticker.value().type_name(), "GrandChild");
}

fn grand_child(name: &str) -> GrandChild {
    GrandChild {
        base: Child {
            time: 3,
            timer: 2,
            target: None,
        },
        name: name.into(),
    }
}

#[test]
fn test_adopted_envelope_is_written_once_restored() {
    let registry = registry(DeserializeConfig::default());
    let channel = ReferenceChannel::direct();
    let mut rig = Rig::default();
    rig.ticker
        .set_envelope(Envelope::record(&grand_child("adopted"), &channel).unwrap());

    // before the restore, the parent still writes the declared value
    let mut read = Rig::default();
    from_buffer(&mut read, &mut to_buffer(&rig, &channel).unwrap(), &registry, &channel).unwrap();
    assert_eq!(read.ticker.type_identifier(), "");
    assert_eq!(read, rig);

    rig.ticker.restore(&registry, &channel).unwrap();
    let mut read = Rig::default();
    from_buffer(&mut read, &mut to_buffer(&rig, &channel).unwrap(), &registry, &channel).unwrap();
    assert_eq!(read.ticker.type_identifier(), "GrandChild");
    assert_eq!(
        downcast_ref::<GrandChild, _>(read.ticker.value()),
        Some(&grand_child("adopted"))
    );
}

#[test]
fn test_failed_restore_keeps_field_writable() {
    let registry = registry(DeserializeConfig::default());
    let channel = ReferenceChannel::direct();
    let mut rig = Rig::default();
    rig.ticker.substitute(&registry, "GrandChild").unwrap();
    let payload = to_buffer(&grand_child("lost"), &channel).unwrap();
    rig.ticker.set_envelope(Envelope::new("Nope", payload));
    assert_eq!(
        rig.ticker.restore(&registry, &channel),
        Err(EntityError::UnknownType("Nope".to_string()))
    );
    assert_eq!(rig.ticker.type_identifier(), "GrandChild");

    let mut read = Rig::default();
    from_buffer(&mut read, &mut to_buffer(&rig, &channel).unwrap(), &registry, &channel).unwrap();
    assert_eq!(read.ticker.type_identifier(), "GrandChild");
    assert_eq!(read, rig);
}

#[test]
fn test_variant_of_another_interface_is_unknown() {
    let registry = registry(DeserializeConfig::default());
    let channel = ReferenceChannel::direct();
    // Mount is an entity, but not a ticker
    let envelope = Envelope::record(&Mount::default(), &channel).unwrap();
    assert_eq!(
        envelope
            .instantiate(&registry, &channel, default_ticker)
            .unwrap_err(),
        EntityError::UnknownType("Mount".to_string())
    );
}

#[test]
fn test_unknown_array_element_fallback() {
    let registry = registry(DeserializeConfig {
        unknown_type: UnknownTypePolicy::FallbackToDeclared,
        ..Default::default()
    });
    let channel = ReferenceChannel::direct();

    // a writer that knows one more variant than the reader
    let mut buffer = Buffer::new();
    buffer.write_len(2).unwrap();
    buffer.write_string("Spring").unwrap();
    buffer.write_sized(&[1, 2, 3]).unwrap();
    let mut ctx = SerializeContext::new(&mut buffer, &channel);
    ctx.write_polymorphic(&GrandChild::default() as &dyn Ticker)
        .unwrap();
    buffer.write_i32(77).unwrap();

    let mut ctx = DeserializeContext::new(&mut buffer, &registry, &channel);
    let tickers = ctx.read_entities(default_ticker).unwrap();
    assert_eq!(tickers.len(), 2);
    assert_eq!(tickers[0].type_name(), "Child");
    assert_eq!(tickers[1].type_name(), "GrandChild");
    assert_eq!(ctx.read::<i32>().unwrap(), 77);
}

#[test]
fn test_clone_entity() {
    let registry = registry(DeserializeConfig::default());
    let original: Box<dyn Ticker> = Box::new(GrandChild {
        base: Child {
            time: 2,
            timer: 1,
            target: Some(scene_object("crate")),
        },
        name: "copy me".into(),
    });
    let mut copy = clone_entity(&registry, &*original).unwrap();
    assert!(*copy == *original);

    // the copy is independent
    copy.tick();
    assert!(*copy != *original);
}

#[test]
fn test_registry_agreement() {
    let mut local = registry(DeserializeConfig::default());
    let mut remote = registry(DeserializeConfig {
        verify_frames: false,
        ..Default::default()
    });
    assert_eq!(local.finish(), remote.finish());

    let mut extended = EntityRegistry::default();
    extended
        .add::<dyn Ticker>(|| Box::new(Child::default()))
        .unwrap();
    extended.declare::<dyn Ticker>("Spring").unwrap();
    assert_eq!(
        extended.validate(),
        Err(EntityError::MissingFactory("Spring".to_string()))
    );
    assert_eq!(
        extended.variants::<dyn Ticker>().collect::<Vec<_>>(),
        vec!["Child", "Spring"]
    );
    assert_ne!(extended.finish(), local.finish());
}
