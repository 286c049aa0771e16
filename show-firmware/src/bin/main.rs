// Keine Standard-Bibliothek verwenden (Embedded System)
#![no_std]
// Kein normaler main() Einstiegspunkt (wird von esp_rtos bereitgestellt)
#![no_main]
// Verbiete mem::forget - gefährlich bei ESP HAL Types mit DMA-Buffern
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
// Verbiete große Stack-Frames (Stack ist auf Embedded Systemen begrenzt)
#![deny(clippy::large_stack_frames)]

// Heap Allocator (WiFi-Treiber benötigt dynamischen Speicher)
extern crate alloc;

// Embassy Async Runtime
use defmt::info;
use embassy_executor::Spawner;
use embassy_time::{Duration, Timer};

// ESP32-C6 HAL
use esp_hal::clock::CpuClock;
use esp_hal::timer::timg::TimerGroup;
use esp_hal::usb_serial_jtag::UsbSerialJtag;
use esp_radio::wifi::{ClientConfig, ModeConfig};

// Backtrace bei Panic und println!() Support
use {esp_backtrace as _, esp_println as _};

// Projekt-Module und Konfiguration
use esp_show_sync::Role;
use esp_show_sync::config::{ESPNOW_CHANNEL, EXTRA_HEAP_SIZE, WIFI_HEAP_SIZE, node_config};
use esp_show_sync::hal::{EspNowTransport, RadioLink};
use esp_show_sync::tasks::show_loop_task;
use show_core::NullTransport;

// ESP-IDF App Descriptor - erforderlich für den Bootloader!
// Ohne diesen schlägt das Flashen mit "ESP-IDF App Descriptor missing" fehl
esp_bootloader_esp_idf::esp_app_desc!();

/// Main Entry Point
///
/// Initialisiert Hardware, startet bei Bedarf den Funk (ESP-NOW) und spawnt
/// den Show-Loop Task. Danach schläft main() - alle Arbeit läuft im Task.
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    // ESP32-C6 Konfiguration: CPU auf maximale Taktfrequenz (160 MHz)
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    // Heap Allocator initialisieren (WiFi-Treiber braucht dynamischen Speicher!)
    esp_alloc::heap_allocator!(
        #[esp_hal::ram(reclaimed)]
        size: WIFI_HEAP_SIZE
    );
    esp_alloc::heap_allocator!(size: EXTRA_HEAP_SIZE);

    // Embassy Runtime initialisieren (Timer + Software Interrupt)
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let sw_interrupt =
        esp_hal::interrupt::software::SoftwareInterruptControl::new(peripherals.SW_INTERRUPT);
    esp_rtos::start(timg0.timer0, sw_interrupt.software_interrupt0);

    let role = node_config().role;

    // Standalone-Knoten brauchen keinen Funk
    let link = if role == Role::Standalone {
        info!("Radio: disabled (standalone)");
        RadioLink::Offline(NullTransport)
    } else {
        // WiFi Hardware initialisieren (ESP-NOW läuft über den WiFi-Treiber)
        static RADIO_INIT: static_cell::StaticCell<esp_radio::Controller> =
            static_cell::StaticCell::new();
        let radio_init =
            RADIO_INIT.init(esp_radio::init().expect("Failed to initialize Wi-Fi/BLE controller"));

        let (mut wifi_controller, interfaces) =
            esp_radio::wifi::new(radio_init, peripherals.WIFI, Default::default())
                .expect("Failed to initialize Wi-Fi");

        // Station-Modus ohne Verbindung: nur nötig damit der Funk läuft
        wifi_controller
            .set_config(&ModeConfig::Client(ClientConfig::default()))
            .expect("Failed to configure Wi-Fi");
        wifi_controller
            .start_async()
            .await
            .expect("Failed to start Wi-Fi");

        // Controller muss leben solange ESP-NOW benutzt wird
        static WIFI_CONTROLLER: static_cell::StaticCell<esp_radio::wifi::WifiController<'static>> =
            static_cell::StaticCell::new();
        WIFI_CONTROLLER.init(wifi_controller);

        let esp_now = interfaces.esp_now;
        esp_now
            .set_channel(ESPNOW_CHANNEL)
            .expect("Failed to set ESP-NOW channel");
        info!("Radio: ESP-NOW on channel {}", ESPNOW_CHANNEL);

        RadioLink::EspNow(EspNowTransport::new(esp_now))
    };

    // Serial-Eingabe: nur die RX-Seite, Ausgabe läuft über esp-println
    let (serial_rx, _serial_tx) = UsbSerialJtag::new(peripherals.USB_DEVICE).split();

    // Spawn Show-Loop Task (besitzt den gesamten Zustand)
    spawner
        .spawn(show_loop_task(
            peripherals.GPIO8,
            peripherals.RMT,
            serial_rx,
            link,
        ))
        .unwrap();

    // Main-Loop: schläft (alle Arbeit läuft im Task)
    loop {
        Timer::after(Duration::from_secs(3600)).await;
    }
}
