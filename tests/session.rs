use std::time::Duration;

use bytes::Bytes;

use prism::blob::PACKET_SIZE;
use prism::effect::morse;
use prism::packet::control::{effect_details_defaults, EffectDetails, EffectName};
use prism::packet::firmware::Version;
use prism::packet::profile::{
    Access, ApplyActive, EffectSettings, MirageFrequencies, MorsePage, PAGE_SIZE, RING_DISABLED,
};
use prism::packet::Packet;
use prism::{Device, Effect, EffectKind, Error, Mirage, Profile, Result, Rgb, Speed, Transport, Zone, ZoneKind};

/// Scripted device answering read requests from a reply table and echoing writes.
#[derive(Default)]
struct MockTransport {
    replies: Vec<(Vec<u8>, Bytes)>,
    rejected: Vec<u8>,
    echo_len: Option<usize>,
    requests: Vec<Vec<u8>>,
}

impl MockTransport {
    /// Answer every request starting with `prefix`.
    fn reply(&mut self, prefix: &[u8], reply: Bytes) {
        self.replies.push((prefix.to_vec(), reply));
    }

    fn reply_with<P: Packet>(&mut self, prefix: &[u8], packet: &P) {
        self.reply(prefix, packet.encode().unwrap());
    }

    /// Reject writes of an operation.
    fn reject(&mut self, operation: u8) {
        self.rejected.push(operation);
    }

    fn operations(&self) -> Vec<(u8, u8)> {
        self.requests.iter().map(|request| (request[0], request[1])).collect()
    }

    fn writes(&self, operation: u8) -> Vec<&Vec<u8>> {
        self.requests.iter().filter(|request| request[0] == 0x51 && request[1] == operation).collect()
    }
}

impl Transport for MockTransport {
    fn exchange(&mut self, request: &[u8], _timeout: Duration) -> Result<Bytes> {
        assert_eq!(request.len(), PACKET_SIZE);
        self.requests.push(request.to_vec());

        if self.rejected.contains(&request[1]) {
            let mut reply = [0; PACKET_SIZE];
            reply[..2].copy_from_slice(&[0xff, 0xaa]);
            reply[4..8].copy_from_slice(&request[..4]);
            return Ok(Bytes::copy_from_slice(&reply));
        }

        if request[0] == 0x51 || request[0] == 0x41 {
            let len = self.echo_len.unwrap_or(PACKET_SIZE);
            return Ok(Bytes::copy_from_slice(&request[..len]));
        }

        self.replies
            .iter()
            .find(|(prefix, _)| request.starts_with(prefix))
            .map(|(_, reply)| reply.clone())
            .ok_or(Error::Timeout)
    }
}

fn stored(zone: ZoneKind, effect: &Effect) -> EffectSettings {
    let mut settings = Zone::new(zone, effect).unwrap().settings().clone();
    Access::Read.apply(&mut settings);
    settings
}

/// Device holding a swirl ring, cycling logo and breathing fan with mirage.
fn scripted_device() -> MockTransport {
    let mut mock = MockTransport::default();

    let mut pair = [0; PACKET_SIZE];
    pair[..6].copy_from_slice(&[0x52, 0x29, 0x00, 0x00, 0xe0, 0x00]);
    mock.reply(&[0x52, 0x29], Bytes::copy_from_slice(&pair));

    for kind in ZoneKind::Ring.effects() {
        let mut effect = Effect::new(*kind);
        if *kind == EffectKind::Swirl {
            effect.set_color(Rgb::new(0x10, 0x20, 0x30)).unwrap();
            effect.set_clockwise(false).unwrap();
        }

        let settings = stored(ZoneKind::Ring, &effect);
        mock.reply_with(&[0x52, 0x2c, 0x01, 0x00, settings.id()], &settings);
    }

    let mut active = ApplyActive::new(Access::Read);
    active.set_ring_id(0x0a);
    mock.reply_with(&[0x52, 0xa0], &active);

    let mut breathing = Effect::new(EffectKind::Breathing);
    breathing.set_color(Rgb::new(0xff, 0x00, 0x00)).unwrap();
    breathing.set_speed(Speed::new(5)).unwrap();
    mock.reply_with(&[0x52, 0x2c, 0x01, 0x00, 0x05], &stored(ZoneKind::Fan, &breathing));
    mock.reply_with(&[0x52, 0x2c, 0x01, 0x00, 0x06], &stored(ZoneKind::Logo, &Effect::new(EffectKind::Cycle)));

    let sos = morse::to_page(&morse::encode("sos"));
    for page in 0..MorsePage::COUNT {
        let mut packet = MorsePage::new(Access::Read, page);
        packet.data = Some(if page % 2 == 0 { sos } else { [0; PAGE_SIZE] });
        mock.reply_with(&[0x52, 0x73, page], &packet);
    }

    let mut frequencies = MirageFrequencies::new(Access::Read);
    frequencies.set_frequency(1, [100, 200, 300]).unwrap();
    frequencies.set_active(Some(1)).unwrap();
    mock.reply_with(&[0x52, 0x94], &frequencies);

    mock
}

#[test]
fn load_profile() {
    let mut device = Device::new(scripted_device());
    let profile = device.load_profile().unwrap();

    assert!(profile.ring_enabled);
    assert_eq!(profile.ring.effect().kind(), EffectKind::Swirl);
    assert_eq!(profile.ring.effect().color().unwrap(), Rgb::new(0x10, 0x20, 0x30));
    assert!(!profile.ring.effect().is_clockwise().unwrap());

    assert_eq!(profile.logo.effect().kind(), EffectKind::Cycle);
    assert_eq!(profile.fan.effect().kind(), EffectKind::Breathing);
    assert_eq!(profile.fan.effect().speed().unwrap(), Speed::new(5));
    assert_eq!(profile.morse(), "sos ");

    let mirage = profile.fan.mirage().unwrap();
    assert!(mirage.is_enabled());
    assert_eq!(mirage.active_slot(), Some(1));
    assert_eq!(mirage.frequency(1).unwrap(), [100, 200, 300]);

    // Loaded settings are ready to be written back.
    assert_eq!(profile.fan.settings().header().mode, Access::Write.mode());

    let transport = device.into_inner();
    let settings_ids: Vec<u8> =
        transport.requests.iter().filter(|request| request[1] == 0x2c).map(|request| request[4]).collect();
    assert_eq!(settings_ids, vec![0x00, 0x07, 0x0a, 0x09, 0x08, 0x0b, 0x02, 0x01, 0x05, 0x06]);

    let operations = transport.operations();
    assert_eq!(operations.first(), Some(&(0x52, 0x29)));
    assert_eq!(operations.last(), Some(&(0x52, 0x94)));
    assert_eq!(operations.iter().filter(|operation| operation.1 == 0x73).count(), 8);
}

#[test]
fn disabled_ring_keeps_static_settings() {
    let mut mock = scripted_device();

    let mut active = ApplyActive::new(Access::Read);
    active.set_ring_id(RING_DISABLED);
    mock.replies.insert(0, (vec![0x52, 0xa0], active.encode().unwrap()));

    let profile = Device::new(mock).load_profile().unwrap();
    assert!(!profile.ring_enabled);
    assert_eq!(profile.ring.effect().kind(), EffectKind::Static);
    assert_eq!(profile.ring_id(), RING_DISABLED);
}

#[test]
fn unknown_ring_effect_falls_back_to_static() {
    let mut mock = scripted_device();

    let mut active = ApplyActive::new(Access::Read);
    active.set_ring_id(0x42);
    mock.replies.insert(0, (vec![0x52, 0xa0], active.encode().unwrap()));

    let profile = Device::new(mock).load_profile().unwrap();
    assert!(profile.ring_enabled);
    assert_eq!(profile.ring.effect().kind(), EffectKind::Static);
    assert_eq!(profile.ring_id(), 0x00);
}

#[test]
fn apply_sequence() {
    let mut profile = Profile::new().unwrap();
    profile.ring.apply_effect(&Effect::new(EffectKind::Morse)).unwrap();
    profile.set_morse("hello world");

    let mut mirage = Mirage::new();
    mirage.set_frequency(0, [45, 90, 180]).unwrap();
    mirage.activate(Some(0)).unwrap();
    profile.fan.set_mirage(Some(&mirage)).unwrap();

    let mut device = Device::new(MockTransport::default());
    device.apply(&profile).unwrap();

    let transport = device.into_inner();
    let mut expected = vec![(0x41, 0x80), (0x51, 0x96), (0x51, 0x28), (0x51, 0x71), (0x51, 0x94)];
    expected.extend(vec![(0x51, 0x2c); 2]);
    expected.extend(vec![(0x51, 0x73); 8]);
    expected.extend(vec![(0x51, 0x2c), (0x51, 0xa0), (0x51, 0x28)]);
    assert_eq!(transport.operations(), expected);

    let settings = transport.writes(0x2c);
    assert_eq!(settings.iter().map(|request| request[4]).collect::<Vec<_>>(), vec![0x05, 0x06, 0x0b]);

    let pages = transport.writes(0x73);
    assert_eq!(pages[0][4..], profile.morse_pages[0][..]);
    assert_eq!(pages[2][4..], profile.morse_pages[2][..]);

    let active = transport.writes(0xa0)[0];
    assert_eq!(&active[4..10], &[0x00, 0x03, 0x00, 0x00, 0x05, 0x06]);
    assert!(active[10..25].iter().all(|id| *id == 0x0b));

    let profile_id = transport.writes(0x28)[0];
    assert_eq!(&profile_id[4..6], &[0xe0, 0x00]);
}

#[test]
fn apply_disabled_ring() {
    let mut profile = Profile::new().unwrap();
    profile.ring.apply_effect(&Effect::new(EffectKind::Morse)).unwrap();
    profile.ring_enabled = false;

    let mut device = Device::new(MockTransport::default());
    device.apply(&profile).unwrap();

    let transport = device.into_inner();
    assert!(transport.writes(0x73).is_empty());
    assert!(transport.writes(0x71).is_empty());
    assert_eq!(transport.writes(0x2c).len(), 2);

    let active = transport.writes(0xa0)[0];
    assert!(active[10..25].iter().all(|id| *id == RING_DISABLED));
}

#[test]
fn loaded_profile_written_back() {
    let mut device = Device::new(scripted_device());
    let profile = device.load_profile().unwrap();

    let mut device = Device::new(MockTransport::default());
    device.apply(&profile).unwrap();
    let transport = device.into_inner();

    // Settings are echoed with the mode switched from read to write.
    let source = scripted_device();
    for written in transport.writes(0x2c) {
        let (_, reply) = source.replies.iter().find(|(prefix, _)| prefix.len() == 5 && prefix[4] == written[4]).unwrap();
        assert_eq!(&written[1..], &reply[1..]);
    }

    let frequencies = transport.writes(0x94)[0];
    assert_eq!(frequencies[4], 0x07);
}

#[test]
fn rejected_write() {
    let mut mock = MockTransport::default();
    mock.reject(0x96);

    let mut device = Device::new(mock);
    let result = device.apply(&Profile::new().unwrap());
    assert!(matches!(result, Err(Error::Io(_))));

    // Nothing is sent after the rejected request.
    assert_eq!(device.transport().requests.len(), 2);
}

#[test]
fn short_write_reply() {
    let mut mock = MockTransport::default();
    mock.echo_len = Some(8);

    let mut device = Device::new(mock);
    let result = device.apply(&Profile::new().unwrap());
    assert!(matches!(result, Err(Error::InvalidLength { expected: 64, actual: 8 })));
    assert_eq!(device.transport().requests.len(), 1);

    device.transport_mut().echo_len = Some(0);
    assert!(matches!(device.reload(), Err(Error::InvalidLength { actual: 0, .. })));
}

#[test]
fn unexpected_reply() {
    let mut mock = MockTransport::default();
    let mut reply = [0; PACKET_SIZE];
    reply[..2].copy_from_slice(&[0x12, 0x21]);
    mock.reply(&[0x12, 0x20], Bytes::copy_from_slice(&reply));

    let mut device = Device::new(mock);
    assert!(matches!(device.firmware_version(), Err(Error::Io(_))));

    let response = device.post(&Version::new()).unwrap();
    assert!(response.is_error());
}

#[test]
fn timeout() {
    let mut device = Device::new(MockTransport::default()).with_timeout(Duration::from_millis(10));
    assert!(matches!(device.load_profile(), Err(Error::Timeout)));
}

#[test]
fn firmware_strings() {
    let mut mock = MockTransport::default();

    let mut version = Version::new();
    version.version = Some("V1.08".into());
    mock.reply_with(&[0x12, 0x20], &version);

    let mut details = EffectDetails::new();
    details.fields = Some(effect_details_defaults(2).unwrap());
    mock.reply_with(&[0x40, 0x20], &details);

    for (index, name) in ["Static", "Breathing"].iter().enumerate() {
        let mut packet = EffectName::new(index as u8);
        packet.name = Some(name.to_string());
        mock.reply_with(&[0x40, 0x21, index as u8], &packet);
    }

    let mut device = Device::new(mock);
    assert_eq!(device.firmware_version().unwrap(), "V1.08");
    assert_eq!(device.effect_names().unwrap(), vec!["Static".to_string(), "Breathing".to_string()]);
}
