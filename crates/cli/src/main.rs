//! kvm-switch
//!
//! Flip a SIIG USB KVM switch to its other input. Finds the dongle on the
//! bus, borrows its vendor HID interface from the kernel, sends the switch
//! command, and puts everything back the way it was.

use anyhow::{Context, Result};
use clap::Parser;
use switcher::{RusbAccess, UsbAccess, find_switch};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "kvm-switch")]
#[command(author, version, about = "Flip a SIIG USB KVM switch to its other input")]
struct Args {
    /// List USB devices visible on the bus and exit
    #[arg(long)]
    list_devices: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(&args.log_level)?;

    let usb = RusbAccess::new().context("Failed to initialize USB context")?;

    if args.list_devices {
        return list_devices_mode(&usb);
    }

    let session = find_switch(&usb).context("Failed to acquire the KVM switch")?;
    info!(
        "Acquired switch on interface {}",
        session.interface_number()
    );

    session
        .trigger()
        .context("Failed to send the switch command")?;
    info!("Switch command sent");

    Ok(())
}

/// Setup tracing subscriber, honoring RUST_LOG over the flag value.
fn setup_logging(default_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .context("Invalid log filter")?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    Ok(())
}

/// Print every device on the bus, then exit.
fn list_devices_mode(usb: &RusbAccess) -> Result<()> {
    let devices = usb.devices().context("Failed to enumerate USB devices")?;

    if devices.is_empty() {
        println!("No USB devices found.");
        return Ok(());
    }

    println!("Found {} USB device(s):", devices.len());
    for device in &devices {
        let (bus, address) = usb.location(device);
        match usb.device_ids(device) {
            Ok((vid, pid)) => {
                println!("  Bus {:03} Device {:03}: {:04x}:{:04x}", bus, address, vid, pid);
            }
            Err(e) => {
                println!(
                    "  Bus {:03} Device {:03}: descriptor unavailable ({})",
                    bus, address, e
                );
            }
        }
    }

    Ok(())
}
