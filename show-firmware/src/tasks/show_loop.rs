// Show Loop Task - kooperative Hauptschleife des Knotens
use defmt::{Display2Format, error, info, warn};
use embassy_time::{Duration, Timer};
use esp_hal::Blocking;
use esp_hal::usb_serial_jtag::UsbSerialJtagRx;
use esp_hal_smartled::smart_led_buffer;
use show_core::pattern::FULL_LEVEL;
use show_core::{
    Clock, Inbound, LocalResponse, Node, OutputSink, StatusReport, StepReport, Transport,
};

use crate::config::{
    BOOT_FLASH_COUNT, BOOT_FLASH_MS, LOOP_TICK_MS, RMT_CLOCK_MHZ, STATUS_JSON_CAPACITY,
    node_config,
};
use crate::hal::{EmbassyClock, LineSource, RadioLink, RmtLedWriter, SerialLineSource};

/// Show Loop Logic - Testbare Schleife ohne Hardware-Abhängigkeit
///
/// Pro Iteration:
/// - höchstens eine Serial-Zeile verarbeiten
/// - `Node::step()`: Funk pollen, PONG senden, Pattern ticken, LED rendern
/// - alles Passierte loggen
/// - kurz schlafen (gibt CPU an andere Tasks zurück)
///
/// # Trait-basierte Abstraktion
/// Transport, Ausgabe, Uhr und Zeilenquelle sind generisch. Die eigentliche
/// Logik steckt in `Node`; die Host-Tests (show-tests) prüfen `Node` mit Mocks,
/// diese Schleife ergänzt nur Logging und Timing.
pub async fn show_loop_logic<T, O, C, S>(mut node: Node<T, O, C>, mut serial: S)
where
    T: Transport,
    O: OutputSink,
    C: Clock,
    S: LineSource,
{
    loop {
        if let Some(line) = serial.poll_line() {
            let response = node.handle_line(&line);
            info!("> {}\n{}", line.as_str(), Display2Format(&response));
            if let LocalResponse::Status(report) = &response {
                log_status_json(report);
            }
        }

        let report = node.step();
        if !report.is_idle() {
            log_report(&report);
        }

        Timer::after(Duration::from_millis(LOOP_TICK_MS)).await;
    }
}

fn log_report(report: &StepReport) {
    match &report.inbound {
        Some(Inbound::Dispatched {
            message,
            meta,
            latency_ms,
            outcome,
        }) => {
            info!(
                "RX {} (rssi {} dBm, latency {} ms): {}",
                message, meta.rssi_dbm, latency_ms, outcome
            );
        }
        Some(Inbound::Rejected { error, meta }) => {
            warn!("RX dropped: {} (rssi {} dBm)", error, meta.rssi_dbm);
        }
        None => {}
    }

    match report.reply {
        Some(Ok(counter)) => info!("PONG sent #{}", counter),
        Some(Err(e)) => warn!("PONG not sent: {}", e),
        None => {}
    }

    if let Some(e) = report.output_error {
        error!("Failed to write to LED: {}", e);
    }
}

/// Status zusätzlich als JSON (für Host-Tools am Serial-Log)
fn log_status_json(report: &StatusReport) {
    let mut json = [0u8; STATUS_JSON_CAPACITY];
    match report.write_json(&mut json) {
        Ok(len) => info!("status json: {=[u8]:a}", &json[..len]),
        Err(_) => warn!("status json: buffer too small"),
    }
}

/// Boot-Anzeige: drei kurze Blitze
async fn boot_flash<O: OutputSink>(led: &mut O) {
    for _ in 0..BOOT_FLASH_COUNT {
        for level in [FULL_LEVEL, 0] {
            if let Err(e) = led.set_level(level) {
                error!("Failed to write to LED: {}", e);
            }
            Timer::after(Duration::from_millis(BOOT_FLASH_MS)).await;
        }
    }
}

/// Show Loop Task - Embassy Task
///
/// Übernimmt die Hardware-Initialisierung und ruft dann die testbare
/// `show_loop_logic()` Funktion auf.
///
/// # Parameter
/// - `gpio8`: GPIO8 Peripheral für LED-Datenleitung
/// - `rmt_peripheral`: RMT Peripheral für präzises Timing
/// - `serial_rx`: Empfangsseite der USB-Serial-JTAG Schnittstelle
/// - `link`: ESP-NOW oder offline (Standalone)
#[embassy_executor::task]
pub async fn show_loop_task(
    gpio8: esp_hal::peripherals::GPIO8<'static>,
    rmt_peripheral: esp_hal::peripherals::RMT<'static>,
    serial_rx: UsbSerialJtagRx<'static, Blocking>,
    link: RadioLink<'static>,
) {
    // Buffer für SmartLED Daten erstellen (1 LED)
    let mut rmt_buffer = smart_led_buffer!(1);

    let mut led = match RmtLedWriter::new(gpio8, rmt_peripheral, RMT_CLOCK_MHZ, &mut rmt_buffer) {
        Ok(led) => led,
        Err(e) => {
            error!("LED init failed: {}", e);
            return;
        }
    };

    boot_flash(&mut led).await;

    let config = node_config();
    info!(
        "Show node ready: role {}, link {}, pattern {}",
        config.role, config.link.name, config.initial_pattern
    );

    let node = Node::new(config, link, led, EmbassyClock);
    show_loop_logic(node, SerialLineSource::new(serial_rx)).await;
}
