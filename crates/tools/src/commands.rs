//! Subcommand implementations: init, gen, run, print

use anyhow::{Context, Result};
use tracing::{debug, info};

use somfy_protocol::manchester;
use somfy_protocol::prelude::*;
use somfy_rfraw::prelude::*;

use crate::profile::{Profile, ProfileStore};
use crate::transport::Bridge;

/// Decode a sniffed B1 capture and initialize (or refresh) a profile:
/// device id, rolling code, bucket calibration, and role tokens.
///
/// `device` and `rolling_code` are explicit overrides; `None` means
/// "take the sniffed value". An explicit zero device id is honored.
pub fn init(
    store: &mut ProfileStore,
    profile_name: &str,
    device: Option<u32>,
    rolling_code: Option<u16>,
    b1_tokens: &[String],
) -> Result<()> {
    let capture = Capture::from_tokens(b1_tokens).context("failed to parse B1 capture")?;
    let frame = capture.decode().context("failed to decode capture")?;
    print_frame(&frame);

    let table = capture.bucket_table();
    let token = |role: PulseRole, name: &str| {
        table
            .token_for(role)
            .with_context(|| format!("capture bucket table has no {} pulse", name))
    };

    let device_id = device.unwrap_or_else(|| frame.device_id());
    let rolling_code = rolling_code.unwrap_or_else(|| frame.rolling_code());
    let device_hex = format!("0x{:06X}", device_id);

    // A re-init keeps the stored bridge host.
    let host = store.get(profile_name).ok().and_then(|p| p.host.clone());
    let profile = Profile {
        device: device_hex.clone(),
        rolling_code,
        buckets: capture
            .buckets()
            .iter()
            .map(|b| b.to_string())
            .collect::<Vec<_>>()
            .join(","),
        hw_sync: token(PulseRole::HardwareSync, "hardware-sync")?,
        sw_sync: token(PulseRole::SoftwareSync, "software-sync")?,
        long: token(PulseRole::Long, "long")?,
        short: token(PulseRole::Short, "short")?,
        host,
    };
    store.insert(profile_name, profile);
    store.save()?;

    info!(
        profile = profile_name,
        device = %device_hex,
        rolling_code,
        "profile initialized"
    );
    Ok(())
}

/// Build the next transmission for a profile: bump and persist the
/// rolling code, then assemble the full B0 command string.
///
/// The rolling code is written back before this returns, independent
/// of what the caller does with the command; the receiver rejects
/// replayed codes, so a code must never be reused even when the
/// transmit that follows fails.
pub fn generate(
    store: &mut ProfileStore,
    profile_name: &str,
    command: Command,
    repeat: u8,
) -> Result<String> {
    let profile = store.get(profile_name)?;
    let device_id = profile.device_id()?;
    let buckets = profile.bucket_values()?;
    let tokens = profile.sync_tokens();
    let rolling_code = profile.rolling_code.wrapping_add(1);

    let mut frame = SomfyFrame::build(command, rolling_code, device_id);
    print_frame(&frame);
    frame.obfuscate();
    debug!(obfuscated = %frame, "frame ready for encoding");

    let bits = manchester::frame_bits(frame.to_bits());
    let payload = manchester::encode(&bits, &tokens.long, &tokens.short)?;
    let raw = build_raw_command(repeat, &buckets, &tokens, &payload)?;

    store.get_mut(profile_name)?.rolling_code = rolling_code;
    store.save()?;

    Ok(raw)
}

/// Generate and transmit through the bridge.
pub fn run(
    store: &mut ProfileStore,
    profile_name: &str,
    command: Command,
    repeat: u8,
    host_override: Option<&str>,
) -> Result<()> {
    let host = match host_override {
        Some(host) => host.to_string(),
        None => store
            .get(profile_name)?
            .host
            .clone()
            .context("no bridge host: pass --host or store one in the profile")?,
    };

    let raw = generate(store, profile_name, command, repeat)?;
    Bridge::new(&host)?.send_raw(&raw)?;
    info!(%command, host = %host, "command transmitted");
    Ok(())
}

/// Decode and display a capture, or display the stored profile when no
/// capture is given.
pub fn print(store: &ProfileStore, profile_name: &str, b1_tokens: &[String]) -> Result<()> {
    if b1_tokens.is_empty() {
        let profile = store.get(profile_name)?;
        println!("Profile:      {}", profile_name);
        println!("Device:       {}", profile.device);
        println!("RollingCode:  {}", profile.rolling_code);
        println!("Buckets:      {}", profile.buckets);
        println!(
            "Tokens:       hw={} sw={} long={} short={}",
            profile.hw_sync, profile.sw_sync, profile.long, profile.short
        );
        if let Some(host) = &profile.host {
            println!("Host:         {}", host);
        }
        return Ok(());
    }

    let capture = Capture::from_tokens(b1_tokens).context("failed to parse B1 capture")?;
    let frame = capture.decode().context("failed to decode capture")?;
    print_frame(&frame);
    if !frame.checksum_valid() {
        println!("WARNING: checksum mismatch");
    }
    Ok(())
}

/// Frame layout table, nibble by nibble.
pub fn print_frame(frame: &SomfyFrame) {
    let b = frame.as_bytes();
    println!("Group       A       B       C       D       F               G");
    println!("Byte:       0H      0L      1H      1L      2       3       4       6       7");
    println!("        +-------+-------+-------+-------+-------+-------+-------+-------+-------+");
    println!("        !  0xA  + R-KEY ! C M D + C K S !  Rollingcode  ! Remote Handheld Addr. !");
    println!(
        "        !  0x{:01X}  +  0x{:01X}  !  0x{:01X}  +  0x{:01X}  !    0x{:04X}     !       0x{:06X}        !",
        b[0] >> 4,
        b[0] & 0x0F,
        b[1] >> 4,
        b[1] & 0x0F,
        frame.rolling_code(),
        frame.device_id()
    );
    println!("        +-------+-------+-------+-------+MSB----+----LSB+LSB----+-------+----MSB+");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProfileStore;
    use tempfile::TempDir;

    fn seeded_store(dir: &TempDir) -> ProfileStore {
        let mut store = ProfileStore::load(&dir.path().join("profiles.toml")).unwrap();
        store.insert(
            "main",
            Profile {
                device: "0xC0FFEE".to_string(),
                rolling_code: 4,
                buckets: "2530,4810,1270,650,27360".to_string(),
                hw_sync: "0".to_string(),
                sw_sync: "1".to_string(),
                long: "2".to_string(),
                short: "3".to_string(),
                host: None,
            },
        );
        store.save().unwrap();
        store
    }

    #[test]
    fn test_generate_bumps_and_persists_rolling_code() {
        let dir = TempDir::new().unwrap();
        let mut store = seeded_store(&dir);

        let raw = generate(&mut store, "main", Command::Up, 1).unwrap();
        assert!(raw.starts_with("RfRaw AA B0 "));
        assert!(raw.ends_with(" 55"));
        assert_eq!(store.get("main").unwrap().rolling_code, 5);

        // The increment survived the rewrite.
        let reloaded = ProfileStore::load(&dir.path().join("profiles.toml")).unwrap();
        assert_eq!(reloaded.get("main").unwrap().rolling_code, 5);
    }

    #[test]
    fn test_generated_command_round_trips_through_decoder() {
        let dir = TempDir::new().unwrap();
        let mut store = seeded_store(&dir);

        let raw = generate(&mut store, "main", Command::Down, 1).unwrap();
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        let b1 = format!(
            "AA B1 5 {} {} {} {} {} {} 55",
            tokens[6], tokens[7], tokens[8], tokens[9], tokens[10], tokens[11]
        );
        let frame = Capture::parse(&b1).unwrap().decode().unwrap();
        assert_eq!(frame.command(), Some(Command::Down));
        assert_eq!(frame.rolling_code(), 5);
        assert_eq!(frame.device_id(), 0xC0FFEE);
        assert!(frame.checksum_valid());
    }

    #[test]
    fn test_init_creates_profile_from_generated_capture() {
        let dir = TempDir::new().unwrap();
        let mut store = seeded_store(&dir);
        let raw = generate(&mut store, "main", Command::Up, 1).unwrap();
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        let b1: Vec<String> = ["AA", "B1", "5"]
            .into_iter()
            .map(str::to_string)
            .chain(tokens[6..12].iter().map(|t| t.to_string()))
            .chain(["55".to_string()])
            .collect();

        let mut store = ProfileStore::load(&dir.path().join("fresh.toml")).unwrap();
        init(&mut store, "sniffed", None, None, &b1).unwrap();
        let profile = store.get("sniffed").unwrap();
        assert_eq!(profile.device_id().unwrap(), 0xC0FFEE);
        assert_eq!(profile.rolling_code, 5);
        assert_eq!(profile.hw_sync, "0");
        assert_eq!(profile.short, "3");
    }

    #[test]
    fn test_init_honors_explicit_zero_device() {
        let dir = TempDir::new().unwrap();
        let mut store = seeded_store(&dir);
        let raw = generate(&mut store, "main", Command::Up, 1).unwrap();
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        let b1: Vec<String> = ["AA", "B1", "5"]
            .into_iter()
            .map(str::to_string)
            .chain(tokens[6..12].iter().map(|t| t.to_string()))
            .collect();

        let mut store = ProfileStore::load(&dir.path().join("fresh.toml")).unwrap();
        init(&mut store, "zero", Some(0), None, &b1).unwrap();
        assert_eq!(store.get("zero").unwrap().device_id().unwrap(), 0);
    }

    #[test]
    fn test_run_requires_host() {
        let dir = TempDir::new().unwrap();
        let mut store = seeded_store(&dir);
        let before = store.get("main").unwrap().rolling_code;
        assert!(run(&mut store, "main", Command::My, 1, None).is_err());
        // Host resolution fails before the rolling code is consumed.
        assert_eq!(store.get("main").unwrap().rolling_code, before);
    }
}
