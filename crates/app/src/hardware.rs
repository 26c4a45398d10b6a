use average::{Estimate, MeanWithError};
use dummy_pin::DummyPin;
use esp_idf_svc::hal::{
    adc::*,
    delay::{Delay, FreeRtos},
    gpio::{AnyInputPin, AnyOutputPin, Gpio35, Output, PinDriver},
    modem::Modem,
    prelude::Peripherals,
    spi::{SpiDeviceDriver, SpiDriverConfig, SPI3},
    sys::EspError,
    units::MegaHertz,
};
use it8951::{
    interface::{IT8951Interface, IT8951SPIInterface},
    memory_converter_settings::MemoryConverterSetting,
    Config, Run, IT8951,
};
use oneshot::{AdcChannelDriver, AdcDriver};
use uom::si::electric_potential::volt;

use display::battery::{self, Voltage};

pub type M5Display<'a> = IT8951<
    IT8951SPIInterface<
        SpiDeviceDriver<'a, esp_idf_svc::hal::spi::SpiDriver<'a>>,
        PinDriver<'a, AnyInputPin, esp_idf_svc::hal::gpio::Input>,
        DummyPin<dummy_pin::level::High>,
        Delay,
    >,
    Run,
>;

pub struct SystemPeripherals<'a> {
    pub modem: Modem,
    pub display: DisplayPeripherals,
    pub power: Power<'a>,
    pub batt_adc: ADC1,
    pub batt_adc_pin: Gpio35,
}

pub struct DisplayPeripherals {
    pub spi: SPI3,
    pub cs: AnyOutputPin,
    pub mi: AnyInputPin,
    pub mo: AnyOutputPin,
    pub sck: AnyOutputPin,
    pub busy: AnyInputPin,
}

pub struct Power<'a> {
    pub main: PinDriver<'a, AnyOutputPin, Output>,
    pub display: PinDriver<'a, AnyOutputPin, Output>,
}

impl SystemPeripherals<'_> {
    pub fn take() -> Self {
        let peripherals = Peripherals::take().expect("unable to get peripherals");

        SystemPeripherals {
            modem: peripherals.modem,
            batt_adc: peripherals.adc1,
            batt_adc_pin: peripherals.pins.gpio35,
            power: Power {
                main: PinDriver::output(AnyOutputPin::from(peripherals.pins.gpio2))
                    .expect("main power pin"),
                display: PinDriver::output(AnyOutputPin::from(peripherals.pins.gpio23))
                    .expect("display power pin"),
            },

            display: DisplayPeripherals {
                spi: peripherals.spi3,
                cs: peripherals.pins.gpio15.into(),
                mi: peripherals.pins.gpio13.into(),
                mo: peripherals.pins.gpio12.into(),
                sck: peripherals.pins.gpio14.into(),
                busy: peripherals.pins.gpio27.into(),
            },
        }
    }
}

pub struct BatteryGauge<'a> {
    adc_channel: AdcChannelDriver<'a, Gpio35, Box<AdcDriver<'a, ADC1>>>,
}

pub fn batt_gauge_create<'a>(
    adc: &'a mut ADC1,
    batt_pin: &'a mut Gpio35,
) -> Result<BatteryGauge<'a>, EspError> {
    BatteryGauge::new(adc, batt_pin)
}

impl<'a> BatteryGauge<'a> {
    pub fn new(adc: &'a mut ADC1, batt_pin: &'a mut Gpio35) -> Result<Self, EspError> {
        use esp_idf_svc::hal::adc::attenuation::DB_11;
        use esp_idf_svc::hal::adc::oneshot::config::AdcChannelConfig;
        use esp_idf_svc::hal::adc::oneshot::AdcDriver;
        use esp_idf_svc::hal::adc::oneshot::*;

        let adc: AdcDriver<'a, ADC1> = AdcDriver::new(adc)?;
        let config = AdcChannelConfig {
            attenuation: DB_11,
            calibration: config::Calibration::Line,
            resolution: Resolution::Resolution12Bit,
        };

        let adc = Box::new(adc);
        let adc_channel: AdcChannelDriver<'_, Gpio35, Box<AdcDriver<'a, ADC1>>> =
            AdcChannelDriver::new(adc, batt_pin, &config)?;

        Ok(Self { adc_channel })
    }

    pub fn read_voltage(&mut self) -> Result<Voltage, EspError> {
        // The divider needs a moment to settle after the domain powers up.
        FreeRtos::delay_ms(10);

        let mut m = MeanWithError::new();
        for _ in 0..8 {
            m.add(self.adc_channel.read()? as f64);
        }
        Ok(battery::voltage_from_adc_millivolts(m.mean() as f32))
    }

    pub fn read_level(&mut self) -> Result<u8, EspError> {
        let voltage = self.read_voltage()?;
        let level = battery::level_from_voltage(voltage);
        log::info!("Battery {:.2} V, level {level}%", voltage.get::<volt>());
        Ok(level)
    }
}

pub fn display_create(peripherals: &mut DisplayPeripherals) -> Result<M5Display, EspError> {
    log::info!("Initializing display");
    let spi = SpiDeviceDriver::new_single(
        &mut peripherals.spi,
        &mut peripherals.sck,
        &mut peripherals.mo,
        Some(&mut peripherals.mi),
        Some(&mut peripherals.cs),
        &SpiDriverConfig::new(),
        &esp_idf_svc::hal::spi::config::Config::new().baudrate(MegaHertz(10).into()),
    )?;

    let mut display_interface = IT8951SPIInterface::new(
        spi,
        PinDriver::input(&mut peripherals.busy)?,
        DummyPin::new_high(),
        Delay::new_default(),
    );

    display_interface
        .wait_while_busy()
        .expect("Timeout display init");

    let epd: M5Display = IT8951::new_with_mcs(
        display_interface,
        Config::default(),
        MemoryConverterSetting {
            rotation: it8951::memory_converter_settings::MemoryConverterRotation::Rotate90,
            ..Default::default()
        },
    )
    .init(2300)
    .expect("Unable to initialize display");

    log::info!("Initialized display: {:?}", epd.get_dev_info());

    Ok(epd)
}
