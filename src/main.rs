//! Wraith Prism CLI tool

use std::error::Error;
use std::fmt::{self, Debug, Display, Formatter};
use std::io::{self, Write};
use std::num::ParseIntError;
use std::process;
use std::str::FromStr;
use std::time::Duration;

use clap::builder::EnumValueParser;
use clap::{crate_description, crate_name, crate_version, Arg, ArgAction, ArgMatches, Command, ValueEnum};
use tracing_subscriber::EnvFilter;

use prism::effect::{morse, Caps};
use prism::{Brightness, Device, EffectKind, HidTransport, Profile, Rgb, Speed, ZoneKind};

/// Colors used to test the available zones.
const TESTCOLORS: [Rgb; 3] = [
    Rgb { r: 0xff, g: 0x00, b: 0x00 },
    Rgb { r: 0x00, g: 0xff, b: 0x00 },
    Rgb { r: 0x00, g: 0x00, b: 0xff },
];

/// Default reply timeout in milliseconds.
const DEFAULT_TIMEOUT: u64 = 100;

/// RGB zone.
#[derive(ValueEnum, Default, PartialEq, Eq, Debug, Copy, Clone)]
enum Zone {
    #[default]
    Ring,
    Logo,
    Fan,
}

impl From<Zone> for ZoneKind {
    fn from(zone: Zone) -> Self {
        match zone {
            Zone::Ring => ZoneKind::Ring,
            Zone::Logo => ZoneKind::Logo,
            Zone::Fan => ZoneKind::Fan,
        }
    }
}

/// Color effect.
#[derive(ValueEnum, Default, PartialEq, Eq, Debug, Copy, Clone)]
enum Effect {
    Off,
    #[default]
    Static,
    Rainbow,
    Cycle,
    Bounce,
    Breathing,
    Swirl,
    Chase,
    Morse,
}

impl From<Effect> for EffectKind {
    fn from(effect: Effect) -> Self {
        match effect {
            Effect::Off => EffectKind::Off,
            Effect::Static => EffectKind::Static,
            Effect::Rainbow => EffectKind::Rainbow,
            Effect::Cycle => EffectKind::Cycle,
            Effect::Bounce => EffectKind::Bounce,
            Effect::Breathing => EffectKind::Breathing,
            Effect::Swirl => EffectKind::Swirl,
            Effect::Chase => EffectKind::Chase,
            Effect::Morse => EffectKind::Morse,
        }
    }
}

/// Fan mirage frequencies.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
enum MirageHertz {
    Off,
    On([u16; 3]),
}

impl FromStr for MirageHertz {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("off") {
            return Ok(MirageHertz::Off);
        }

        let channels = s
            .split(',')
            .map(|channel| u16::from_str(channel.trim()))
            .collect::<Result<Vec<u16>, ParseIntError>>()
            .map_err(|err| format!("invalid frequency: {}", err))?;

        match channels[..] {
            [r, g, b] => Ok(MirageHertz::On([r, g, b])),
            _ => Err(format!("expected 3 frequencies, got {}", channels.len())),
        }
    }
}

impl Display for MirageHertz {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            MirageHertz::Off => write!(f, "off"),
            MirageHertz::On([r, g, b]) => write!(f, "{},{},{}", r, g, b),
        }
    }
}

/// New color config.
struct Config {
    zone: Zone,
    effect: Effect,
    color: Rgb,
    speed: Option<Speed>,
    brightness: Option<Brightness>,
    random: bool,
    counter_clockwise: bool,
    once: bool,
    morse: Option<String>,
    mirage: Option<MirageHertz>,
    timeout: u64,
    interactive: bool,
}

impl Config {
    fn from_cli(matches: &ArgMatches) -> Result<Self, String> {
        let mut config = Config::default();

        // Reject malformed values before prompting for missing ones.
        config.speed = level_from_str(matches, "speed", Speed::MIN, Speed::MAX)?.map(Speed::new);
        config.brightness = level_from_str(matches, "brightness", Brightness::MIN, Brightness::MAX)?
            .map(Brightness::new);
        config.mirage = optional_from_str(matches, "mirage")?;
        config.timeout = optional_from_str(matches, "timeout")?.unwrap_or(DEFAULT_TIMEOUT);

        config.zone = *required_enum::<Zone>(matches, "zone");
        config.effect = *required_enum::<Effect>(matches, "effect");
        config.random = matches.get_flag("random");
        config.counter_clockwise = matches.get_flag("counter-clockwise");
        config.once = matches.get_flag("once");

        let caps = EffectKind::from(config.effect).caps();
        let needs_color = caps.contains(Caps::COLOR) && !config.random;
        if needs_color {
            config.color = required_color(matches);
        }

        let needs_morse = config.effect == Effect::Morse;
        if needs_morse {
            config.morse = Some(required_morse(matches));
        }

        // Determine if some parameters were read from STDIN.
        config.interactive = !matches.contains_id("zone")
            || !matches.contains_id("effect")
            || (needs_color && !matches.contains_id("color"))
            || (needs_morse && !matches.contains_id("morse"));

        Ok(config)
    }

    /// Write this config into the matching zone of a profile.
    fn update(&self, profile: &mut Profile) -> prism::Result<()> {
        let kind = EffectKind::from(self.effect);

        // The ring has no off effect, it is removed from the active zones instead.
        if self.zone == Zone::Ring && kind == EffectKind::Off {
            profile.ring_enabled = false;
            return Ok(());
        }

        let mut effect = prism::Effect::new(kind);
        if effect.caps().contains(Caps::COLOR) {
            effect.set_color(self.color)?;
        }
        if let Some(speed) = self.speed {
            effect.set_speed(speed)?;
        }
        if let Some(brightness) = self.brightness {
            effect.set_brightness(brightness)?;
        }
        if self.random {
            effect.set_random(true)?;
        }
        if self.counter_clockwise {
            effect.set_clockwise(false)?;
        }
        if self.once {
            effect.set_repeat(false)?;
        }

        if let Some(text) = &self.morse {
            profile.set_morse(text);
        }

        let zone = profile.zone_mut(self.zone.into());
        zone.apply_effect(&effect)?;

        match self.mirage {
            Some(MirageHertz::On(hertz)) => {
                let mut mirage = zone.mirage().cloned().unwrap_or_default();
                mirage.set_frequency(0, hertz)?;
                mirage.activate(Some(0))?;
                zone.set_mirage(Some(&mirage))?;
            },
            Some(MirageHertz::Off) => {
                let mut mirage = zone.mirage().cloned().unwrap_or_default();
                mirage.activate(None)?;
                zone.set_mirage(Some(&mirage))?;
            },
            None => (),
        }

        if self.zone == Zone::Ring {
            profile.ring_enabled = true;
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            color: Rgb::new(0xff, 0xff, 0xff),
            timeout: DEFAULT_TIMEOUT,
            counter_clockwise: Default::default(),
            interactive: Default::default(),
            brightness: Default::default(),
            random: Default::default(),
            effect: Default::default(),
            mirage: Default::default(),
            morse: Default::default(),
            speed: Default::default(),
            once: Default::default(),
            zone: Default::default(),
        }
    }
}

impl Display for Config {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        // Add all required parameters.
        write!(
            f,
            "{} \\\n \
            --zone {:?} \\\n \
            --effect {:?}",
            crate_name!(),
            self.zone,
            self.effect,
        )?;

        if self.timeout != DEFAULT_TIMEOUT {
            write!(f, " \\\n  --timeout {}", self.timeout)?;
        }

        // Omit everything else if effect is `Off`.
        if self.effect == Effect::Off {
            return Ok(());
        }

        let caps = EffectKind::from(self.effect).caps();

        if self.random {
            write!(f, " \\\n  --random")?;
        } else if caps.contains(Caps::COLOR) {
            write!(f, " \\\n  --color {}", self.color)?;
        }

        if let Some(brightness) = self.brightness {
            write!(f, " \\\n  --brightness {}", brightness.level())?;
        }

        if let Some(speed) = self.speed {
            write!(f, " \\\n  --speed {}", speed.level())?;
        }

        if self.counter_clockwise {
            write!(f, " \\\n  --counter-clockwise")?;
        }

        if let Some(morse) = &self.morse {
            write!(f, " \\\n  --morse {:?}", morse)?;
        }

        if self.once {
            write!(f, " \\\n  --once")?;
        }

        if let Some(mirage) = self.mirage {
            write!(f, " \\\n  --mirage {}", mirage)?;
        }

        Ok(())
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("prism=warn")),
        )
        .with_target(false)
        .init();

    let cli = cli();
    match cli.subcommand() {
        Some(("zonetest", matches)) => zonetest(matches),
        Some(("morse", matches)) => print_morse(matches),
        Some(("info", matches)) => {
            if let Err(err) = info(matches) {
                eprintln!("\x1b[31mError:\x1b[0m {err}");
            }
        },
        _ => configure(&cli),
    }
}

/// Mark all zones in a unique color.
fn zonetest(matches: &ArgMatches) {
    println!("Are you sure you want to test the available RGB zones?");
    println!("\x1b[31mThis will reset your Wraith Prism configuration\x1b[0m.");
    print!(" [y/N] > ");
    let _ = io::stdout().flush();

    // Abort unless the user agrees to reset their config.
    if stdin_nextline().to_lowercase() != "y" {
        println!("Bailing out.");
        return;
    }

    let timeout = match optional_from_str(matches, "timeout") {
        Ok(timeout) => timeout.unwrap_or(DEFAULT_TIMEOUT),
        Err(err) => {
            eprintln!("\x1b[31mError:\x1b[0m {err}");
            return;
        },
    };

    println!("\nTesting available RGB zones...\n");

    for (zone, color) in Zone::value_variants().iter().zip(TESTCOLORS.iter()) {
        println!("Color for zone {:?}: {}", zone, color);

        let config = Config { color: *color, zone: *zone, timeout, ..Default::default() };

        if let Err(err) = write_config(&config) {
            eprintln!("Skipping zone: {err}");
        }
    }
}

/// Show the morse encoding of a message.
fn print_morse(matches: &ArgMatches) {
    let text = matches.get_one::<String>("text").map(String::as_str).unwrap_or_default();

    let code = morse::encode(text);
    let bytes = morse::to_bytes(&code);
    let stored = morse::from_bytes(&bytes);

    println!("Morse:   {}", code);
    println!("Decoded: {}", morse::decode(&stored));
    println!("Bytes:   {}", prism::blob::dump(&bytes));

    if stored.len() < code.trim_end().len() {
        println!("\x1b[33mMessage truncated to {} symbols.\x1b[0m", morse::MAX_SYMBOLS);
    }
}

/// Print firmware details.
fn info(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let mut device = open_device(timeout(matches)?)?;

    let firmware = device.firmware()?;
    println!("Device:   {}", firmware.details.name());
    println!("USB ID:   {:04x}:{:04x}", firmware.details.vendor_id(), firmware.details.product_id());
    println!("Firmware: {}", firmware.version);

    println!("Effects:");
    for (i, name) in device.effect_names()?.iter().enumerate() {
        println!("  [{}] {}", i, name);
    }

    Ok(())
}

/// Update the Wraith Prism configuration.
fn configure(matches: &ArgMatches) {
    let config = match Config::from_cli(matches) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("\x1b[31mError:\x1b[0m {err}");
            process::exit(1);
        },
    };

    // Print CLI example to skip manual configuration.
    if config.interactive {
        println!("\x1b[32mConfiguration successful.\x1b[0m\n");
        println!("To reapply this config, you can run the following command:\n\n{}\n", config);
    }

    match write_config(&config) {
        Ok(()) => println!("\x1b[32mSuccessfully applied changes.\x1b[0m"),
        Err(err) => eprintln!("\x1b[31mError:\x1b[0m {err}"),
    }
}

/// Update one zone of the stored profile.
fn write_config(config: &Config) -> Result<(), Box<dyn Error>> {
    let mut device = open_device(Duration::from_millis(config.timeout))?;

    let mut profile = device.load_profile()?;
    config.update(&mut profile)?;
    device.apply(&profile)?;

    Ok(())
}

fn open_device(timeout: Duration) -> Result<Device<HidTransport>, Box<dyn Error>> {
    match HidTransport::open() {
        Ok(transport) => Ok(Device::new(transport).with_timeout(timeout)),
        Err(err) => Err(format!("unable to open device: {} (root permissions required)", err).into()),
    }
}

fn timeout(matches: &ArgMatches) -> Result<Duration, String> {
    let timeout = optional_from_str(matches, "timeout")?.unwrap_or(DEFAULT_TIMEOUT);
    Ok(Duration::from_millis(timeout))
}

/// Get clap CLI parameters.
fn cli() -> ArgMatches {
    command().get_matches()
}

/// CLI definition.
fn command() -> Command {
    let timeout = Arg::new("timeout")
        .help("Reply timeout in milliseconds")
        .long("timeout")
        .short('t')
        .global(true);

    Command::new(crate_name!())
        .version(crate_version!())
        .about(crate_description!())
        .arg(timeout)
        .subcommand(Command::new("zonetest").about("Test available RGB zones"))
        .subcommand(Command::new("info").about("Show firmware details"))
        .subcommand(
            Command::new("morse")
                .about("Show the morse code of a message")
                .arg(Arg::new("text").help("Message").required(true)),
        )
        .arg(
            Arg::new("zone")
                .help("Position of the LED")
                .long("zone")
                .short('z')
                .ignore_case(true)
                .value_parser(EnumValueParser::<Zone>::new()),
        )
        .arg(
            Arg::new("effect")
                .help("Color transition effect")
                .long("effect")
                .short('e')
                .ignore_case(true)
                .value_parser(EnumValueParser::<Effect>::new()),
        )
        .arg(Arg::new("color").help("LED color in RGB [0xRRGGBB]").long("color").short('c'))
        .arg(
            Arg::new("speed")
                .help("Effect speed [possible values: 1..=5]")
                .long("speed")
                .short('s'),
        )
        .arg(
            Arg::new("brightness")
                .help("Brightness [possible values: 1..=3]")
                .long("brightness")
                .short('b'),
        )
        .arg(
            Arg::new("random")
                .help("Use random colors instead of a fixed one")
                .long("random")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("counter-clockwise")
                .help("Rotate the ring effect counter-clockwise")
                .long("counter-clockwise")
                .action(ArgAction::SetTrue),
        )
        .arg(Arg::new("morse").help("Message shown by the morse effect").long("morse").short('m'))
        .arg(
            Arg::new("once")
                .help("Show the morse message only once")
                .long("once")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("mirage")
                .help("Fan mirage frequencies in Hz [format: R,G,B or off]")
                .long("mirage"),
        )
}

/// Convert a CLI option from the parameter string.
#[inline]
fn cli_from_str<T>(matches: &ArgMatches, name: &str) -> Option<Result<T, <T as FromStr>::Err>>
where
    T: FromStr,
{
    matches.get_one::<String>(name).map(|value| T::from_str(value))
}

/// Read an optional CLI parameter, failing on malformed values.
fn optional_from_str<T>(matches: &ArgMatches, name: &str) -> Result<Option<T>, String>
where
    T: FromStr,
    <T as FromStr>::Err: Display,
{
    match cli_from_str::<T>(matches, name) {
        Some(Ok(value)) => Ok(Some(value)),
        Some(Err(err)) => Err(format!("invalid --{} parameter: {}", name, err)),
        None => Ok(None),
    }
}

/// Read an optional level within `min..=max`.
fn level_from_str(matches: &ArgMatches, name: &str, min: u8, max: u8) -> Result<Option<u8>, String> {
    match optional_from_str::<u8>(matches, name)? {
        Some(level) if level < min || level > max => {
            Err(format!("invalid --{} parameter: {} is outside of {}..={}", name, level, min, max))
        },
        level => Ok(level),
    }
}

/// Read the color option from CLI or prompt for STDIN if not present.
fn required_color<T: FromStr>(matches: &ArgMatches) -> T {
    match cli_from_str(matches, "color") {
        Some(Ok(value)) => return value,
        Some(Err(_)) => eprintln!("\x1b[31mInvalid CLI color parameter.\x1b[0m\n"),
        _ => (),
    }

    loop {
        print!("Please select a color (format: 0xRRGGBB):\n > ");
        let _ = io::stdout().flush();

        let input = stdin_nextline();

        match T::from_str(&input) {
            Ok(value) => {
                println!();
                break value;
            },
            Err(_) => eprintln!(
                "\x1b[31mColor '{}' does not match format 0xRRGGBB, please try again.\x1b[0m\n",
                input
            ),
        }
    }
}

/// Read the morse message from CLI or prompt for STDIN if not present.
fn required_morse(matches: &ArgMatches) -> String {
    if let Some(text) = matches.get_one::<String>("morse") {
        return text.clone();
    }

    loop {
        print!("Please enter a message:\n > ");
        let _ = io::stdout().flush();

        let input = stdin_nextline();

        if morse::encode(&input).is_empty() {
            eprintln!("\x1b[31mMessage '{}' has no morse code, please try again.\x1b[0m\n", input);
            continue;
        }

        println!();
        break input;
    }
}

/// Read an enum option from CLI or prompt for STDIN if not present.
fn required_enum<'a, T>(matches: &'a ArgMatches, name: &str) -> &'a T
where
    T: ValueEnum + Debug + Copy + Sync + Send + 'static,
{
    if let Some(value) = matches.get_one::<T>(name) {
        return value;
    }

    loop {
        println!("[{}] Please select a number:", name);
        let variants = T::value_variants();
        for (i, variant) in variants.iter().enumerate() {
            println!("  [{}] {:?}", i, variant);
        }
        print!(" > ");
        let _ = io::stdout().flush();

        let input = stdin_nextline();

        match usize::from_str(&input).ok().and_then(|index| variants.get(index)) {
            Some(variant) => {
                println!();
                return variant;
            },
            // Query again if the variant is not valid.
            _ => println!("\x1b[31mVariant '{}' does not exist, please try again.\x1b[0m\n", input),
        }
    }
}

/// Read next line from STDIN.
#[inline]
fn stdin_nextline() -> String {
    let mut input = String::new();

    let _ = io::stdin().read_line(&mut input);
    input = input.trim().to_string();

    input
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn testcolors_match_zones() {
        assert_eq!(Zone::value_variants().len(), TESTCOLORS.len());
    }

    #[test]
    fn effects_match_library() {
        let kinds: Vec<EffectKind> = Effect::value_variants().iter().map(|e| EffectKind::from(*e)).collect();
        assert_eq!(kinds.len(), EffectKind::ALL.len());
        assert!(EffectKind::ALL.iter().all(|kind| kinds.contains(kind)));
    }

    fn parse(extra: &[&str]) -> Result<Config, String> {
        let mut args = vec!["prism", "--zone", "fan", "--effect", "breathing", "--color", "0x112233"];
        args.extend_from_slice(extra);

        let matches = command().try_get_matches_from(args).unwrap();
        Config::from_cli(&matches)
    }

    #[test]
    fn malformed_parameters() {
        assert!(parse(&["--speed", "abc"]).is_err());
        assert!(parse(&["--speed", "9"]).is_err());
        assert!(parse(&["--brightness", "0"]).is_err());
        assert!(parse(&["--mirage", "100,200"]).is_err());
        assert!(parse(&["--timeout", "soon"]).is_err());
    }

    #[test]
    fn parameters_from_cli() {
        let config = parse(&["--speed", "2", "--brightness", "3", "--mirage", "100,200,300", "-t", "250"]).unwrap();

        assert_eq!(config.zone, Zone::Fan);
        assert_eq!(config.effect, Effect::Breathing);
        assert_eq!(config.color, Rgb::new(0x11, 0x22, 0x33));
        assert_eq!(config.speed, Some(Speed::new(2)));
        assert_eq!(config.brightness, Some(Brightness::new(3)));
        assert_eq!(config.mirage, Some(MirageHertz::On([100, 200, 300])));
        assert_eq!(config.timeout, 250);
        assert!(!config.interactive);
    }

    #[test]
    fn mirage_hertz() {
        assert_eq!(MirageHertz::from_str("off"), Ok(MirageHertz::Off));
        assert_eq!(MirageHertz::from_str("100, 200,300"), Ok(MirageHertz::On([100, 200, 300])));
        assert!(MirageHertz::from_str("100,200").is_err());
        assert!(MirageHertz::from_str("100,200,300,400").is_err());
        assert_eq!(MirageHertz::On([45, 2000, 330]).to_string(), "45,2000,330");
    }

    #[test]
    fn reproducible_command() {
        let config = Config {
            zone: Zone::Fan,
            effect: Effect::Breathing,
            color: Rgb::new(0x12, 0x34, 0x56),
            speed: Some(Speed::new(4)),
            mirage: Some(MirageHertz::On([100, 200, 300])),
            ..Default::default()
        };

        let command = config.to_string();
        assert!(command.contains("--zone Fan"));
        assert!(command.contains("--effect Breathing"));
        assert!(command.contains("--color 0x123456"));
        assert!(command.contains("--speed 4"));
        assert!(command.contains("--mirage 100,200,300"));
        assert!(!command.contains("--brightness"));
    }

    #[test]
    fn ring_off_disables_ring() {
        let mut profile = Profile::new().unwrap();
        let config = Config { zone: Zone::Ring, effect: Effect::Off, ..Default::default() };

        config.update(&mut profile).unwrap();
        assert!(!profile.ring_enabled);
        assert_eq!(profile.ring.effect().kind(), EffectKind::Static);
    }

    #[test]
    fn update_fan_with_mirage() {
        let mut profile = Profile::new().unwrap();
        let config = Config {
            zone: Zone::Fan,
            effect: Effect::Cycle,
            speed: Some(Speed::new(5)),
            mirage: Some(MirageHertz::On([100, 200, 300])),
            ..Default::default()
        };

        config.update(&mut profile).unwrap();
        assert_eq!(profile.fan.effect().kind(), EffectKind::Cycle);
        assert_eq!(profile.fan.effect().speed().unwrap(), Speed::new(5));

        let mirage = profile.fan.mirage().unwrap();
        assert_eq!(mirage.active_slot(), Some(0));
        assert_eq!(mirage.frequency(0).unwrap(), [100, 200, 300]);
    }

    #[test]
    fn unsupported_setting() {
        let mut profile = Profile::new().unwrap();
        let config = Config { zone: Zone::Logo, effect: Effect::Static, speed: Some(Speed::new(2)), ..Default::default() };

        assert!(config.update(&mut profile).is_err());
        assert_eq!(profile.logo, Profile::new().unwrap().logo);
    }

    #[test]
    fn mirage_rejected_on_logo() {
        let mut profile = Profile::new().unwrap();
        let config = Config { zone: Zone::Logo, mirage: Some(MirageHertz::Off), ..Default::default() };

        assert!(config.update(&mut profile).is_err());
        assert!(profile.logo.mirage().is_none());
    }

    #[test]
    fn morse_message_stored() {
        let mut profile = Profile::new().unwrap();
        let config = Config {
            zone: Zone::Ring,
            effect: Effect::Morse,
            morse: Some("hi".into()),
            once: true,
            ..Default::default()
        };

        config.update(&mut profile).unwrap();
        assert_eq!(profile.morse(), "hi ");
        assert!(!profile.ring.effect().is_repeat().unwrap());
    }
}
