//! List commands implementation

use crate::programmers;

/// List all supported programmers
pub fn list_programmers() {
    println!("Supported programmers:");
    println!();
    for p in programmers::available_programmers() {
        println!("  {:8} - {}", p.name, p.description);
    }
}

/// List connected USB bridges with the default VID/PID
#[cfg(feature = "usb")]
pub fn list_devices() -> Result<(), Box<dyn std::error::Error>> {
    let devices = spiota_usb::UsbBridge::list_devices(
        spiota_usb::BRIDGE_USB_VENDOR,
        spiota_usb::BRIDGE_USB_PRODUCT,
    )?;

    if devices.is_empty() {
        println!(
            "No bridges found (VID:{:04x} PID:{:04x})",
            spiota_usb::BRIDGE_USB_VENDOR,
            spiota_usb::BRIDGE_USB_PRODUCT
        );
        return Ok(());
    }

    for (index, device) in devices.iter().enumerate() {
        println!("  [{}] {}", index, device);
    }
    Ok(())
}

/// List connected USB bridges with the default VID/PID
#[cfg(not(feature = "usb"))]
pub fn list_devices() -> Result<(), Box<dyn std::error::Error>> {
    Err("USB support not compiled in (enable the `usb` feature)".into())
}
