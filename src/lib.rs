//! Driver for the Texas Instruments ADS1118, a 16-bit delta-sigma ADC with an
//! integrated temperature sensor, accessed over SPI.
//!
//! This driver is based on the datasheet which can be found here:
//! https://www.ti.com/lit/ds/symlink/ads1118.pdf
//!
//! The driver keeps the whole configuration register cached in memory.
//! Setters only touch the cache; the full 16-bit word is re-encoded and
//! written on the next conversion trigger, so several setter calls collapse
//! into a single register write.
//!
//! ```ignore
//! let mut adc = ADS1118::new(spi, delay);
//! adc.init()?;
//! adc.set_range(Range::V4_096)?;
//! adc.set_rate(DataRate::Sps128)?;
//!
//! let volts = adc.single_read()?.volts();
//! ```

#![cfg_attr(not(test), no_std)]

use core::fmt;

use embedded_hal::{
    delay::DelayNs,
    spi::{ErrorType, SpiDevice},
};

/* ======== Chip information ======== */

/// Static, purely descriptive data about the part
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Info {
    pub chip_name: &'static str,
    pub manufacturer_name: &'static str,
    pub interface: &'static str,
    pub supply_voltage_min_v: f32,
    pub supply_voltage_max_v: f32,
    pub max_current_ma: f32,
    pub temperature_min: f32,
    pub temperature_max: f32,
    pub driver_version: u32,
}

pub const INFO: Info = Info {
    chip_name: "Texas Instruments ADS1118",
    manufacturer_name: "Texas Instruments",
    interface: "SPI",
    supply_voltage_min_v: 2.0,
    supply_voltage_max_v: 5.5,
    max_current_ma: 0.3,
    temperature_min: -40.0,
    temperature_max: 125.0,
    driver_version: 1000,
};

/* ======== Config register ======== */

const SS_BIT: u16 = 1 << 15;
const MUX_SHIFT: u16 = 12;
const PGA_SHIFT: u16 = 9;
const MODE_BIT: u16 = 1 << 8;
const DR_SHIFT: u16 = 5;
const TS_MODE_BIT: u16 = 1 << 4;
const PULL_UP_EN_BIT: u16 = 1 << 3;
const NOP_MASK: u16 = 0b11 << 1;
const NOP_VALID: u16 = 0b01 << 1;
const RESERVED_BIT: u16 = 1;
const FIELD_MASK: u16 = 0b111;

/// Allowance for leaving power-down before a single-shot conversion starts
const WAKE_UP_US: u32 = 100;

/// Clocked out while reading back a conversion result. NOP = 11 tells the
/// device to ignore the word, so the config register is left untouched.
const READ_ONLY_WORD: [u8; 2] = [0xFF, 0xFF];

/// A field code that does not map to any variant of the field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidCode(pub u8);

/// Input multiplexer setting (MUX[2:0])
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Channel {
    /// AINP = AIN0, AINN = AIN1
    Ain0Ain1 = 0b000,
    /// AINP = AIN0, AINN = AIN3
    Ain0Ain3 = 0b001,
    /// AINP = AIN1, AINN = AIN3
    Ain1Ain3 = 0b010,
    /// AINP = AIN2, AINN = AIN3
    Ain2Ain3 = 0b011,
    /// AINP = AIN0, AINN = GND
    Ain0Gnd = 0b100,
    /// AINP = AIN1, AINN = GND
    Ain1Gnd = 0b101,
    /// AINP = AIN2, AINN = GND
    Ain2Gnd = 0b110,
    /// AINP = AIN3, AINN = GND
    Ain3Gnd = 0b111,
}

impl Channel {
    pub const ALL: [Channel; 8] = [
        Channel::Ain0Ain1,
        Channel::Ain0Ain3,
        Channel::Ain1Ain3,
        Channel::Ain2Ain3,
        Channel::Ain0Gnd,
        Channel::Ain1Gnd,
        Channel::Ain2Gnd,
        Channel::Ain3Gnd,
    ];
}

impl TryFrom<u8> for Channel {
    type Error = InvalidCode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Channel::ALL
            .get(code as usize)
            .copied()
            .ok_or(InvalidCode(code))
    }
}

/// What the ADC samples (TS_MODE)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Mode {
    /// The input selected by the multiplexer
    Adc = 0,
    /// The internal die temperature sensor
    Temperature = 1,
}

impl TryFrom<u8> for Mode {
    type Error = InvalidCode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Mode::Adc),
            1 => Ok(Mode::Temperature),
            _ => Err(InvalidCode(code)),
        }
    }
}

/// Programmable gain amplifier full-scale range (PGA[2:0])
///
/// NOTE: The datasheet aliases codes 110 and 111 to ±0.256V. This driver
/// never writes them and refuses them when decoding.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Range {
    /// ±6.144V, 187.5µV per LSB
    V6_144 = 0b000,
    /// ±4.096V, 125µV per LSB
    V4_096 = 0b001,
    /// ±2.048V, 62.5µV per LSB
    V2_048 = 0b010,
    /// ±1.024V, 31.25µV per LSB
    V1_024 = 0b011,
    /// ±0.512V, 15.625µV per LSB
    V0_512 = 0b100,
    /// ±0.256V, 7.8125µV per LSB
    V0_256 = 0b101,
}

impl Range {
    pub const ALL: [Range; 6] = [
        Range::V6_144,
        Range::V4_096,
        Range::V2_048,
        Range::V1_024,
        Range::V0_512,
        Range::V0_256,
    ];

    /// The largest magnitude the range can represent, in volts
    pub const fn full_scale_volts(self) -> f32 {
        match self {
            Range::V6_144 => 6.144,
            Range::V4_096 => 4.096,
            Range::V2_048 => 2.048,
            Range::V1_024 => 1.024,
            Range::V0_512 => 0.512,
            Range::V0_256 => 0.256,
        }
    }

    /// Voltage represented by one step of the raw code
    pub fn lsb_volts(self) -> f32 {
        self.full_scale_volts() / 32768.0
    }
}

impl TryFrom<u8> for Range {
    type Error = InvalidCode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Range::ALL
            .get(code as usize)
            .copied()
            .ok_or(InvalidCode(code))
    }
}

/// Output data rate (DR[2:0])
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DataRate {
    /// 8 samples per second - every 125ms
    Sps8 = 0b000,
    /// 16 samples per second - every 62.5ms
    Sps16 = 0b001,
    /// 32 samples per second - every 31.25ms
    Sps32 = 0b010,
    /// 64 samples per second - every 15.6ms
    Sps64 = 0b011,
    /// 128 samples per second - every 7.8ms
    Sps128 = 0b100,
    /// 250 samples per second - every 4ms
    Sps250 = 0b101,
    /// 475 samples per second - every 2.1ms
    Sps475 = 0b110,
    /// 860 samples per second - every 1.2ms
    Sps860 = 0b111,
}

impl DataRate {
    pub const ALL: [DataRate; 8] = [
        DataRate::Sps8,
        DataRate::Sps16,
        DataRate::Sps32,
        DataRate::Sps64,
        DataRate::Sps128,
        DataRate::Sps250,
        DataRate::Sps475,
        DataRate::Sps860,
    ];

    pub const fn sps(self) -> u32 {
        match self {
            DataRate::Sps8 => 8,
            DataRate::Sps16 => 16,
            DataRate::Sps32 => 32,
            DataRate::Sps64 => 64,
            DataRate::Sps128 => 128,
            DataRate::Sps250 => 250,
            DataRate::Sps475 => 475,
            DataRate::Sps860 => 860,
        }
    }

    /// Nominal conversion period in microseconds, rounded up
    pub const fn conversion_time_us(self) -> u32 {
        let sps = self.sps();
        (1_000_000 + sps - 1) / sps
    }

    /// Time to wait after triggering a single-shot conversion. The internal
    /// oscillator allows the actual data rate to run at 90% of nominal, which
    /// stretches the period to 10/9 of nominal; the device also needs to wake
    /// from power-down first.
    pub const fn single_shot_wait_us(self) -> u32 {
        let slowest = 9 * self.sps();
        (10_000_000 + slowest - 1) / slowest + WAKE_UP_US
    }
}

impl TryFrom<u8> for DataRate {
    type Error = InvalidCode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        DataRate::ALL
            .get(code as usize)
            .copied()
            .ok_or(InvalidCode(code))
    }
}

/// Device operating mode (MODE)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConversionMode {
    /// R/W: 0
    Continuous,
    /// R/W: 1, power-down between single-shot conversions
    SingleShot,
}

/// The user-facing part of the config register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub channel: Channel,
    pub mode: Mode,
    pub range: Range,
    pub rate: DataRate,
    /// Keeps DOUT/DRDY pulled up while CS is high
    pub dout_pull_up: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            channel: Channel::Ain0Ain1,
            mode: Mode::Adc,
            range: Range::V6_144,
            rate: DataRate::Sps128,
            dout_pull_up: false,
        }
    }
}

/// A complete config register word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Command {
    pub config: Config,
    /// Single-shot conversion start (SS)
    pub start: bool,
    pub conversion: ConversionMode,
}

impl Command {
    /// Packs the register word. NOP is always 01 and the reserved bit 0 is
    /// always 1.
    pub fn to_word(&self) -> u16 {
        let config = &self.config;
        let mut word = NOP_VALID | RESERVED_BIT;

        word |= (config.channel as u16) << MUX_SHIFT;
        word |= (config.range as u16) << PGA_SHIFT;
        word |= (config.rate as u16) << DR_SHIFT;

        if self.start {
            word |= SS_BIT;
        }
        if self.conversion == ConversionMode::SingleShot {
            word |= MODE_BIT;
        }
        if config.mode == Mode::Temperature {
            word |= TS_MODE_BIT;
        }
        if config.dout_pull_up {
            word |= PULL_UP_EN_BIT;
        }

        word
    }

    pub fn to_bytes(&self) -> [u8; 2] {
        self.to_word().to_be_bytes()
    }

    /// Unpacks a register word. Returns `None` if NOP is not 01 (the device
    /// would ignore the word) or PGA holds one of the reserved codes.
    pub fn from_word(word: u16) -> Option<Self> {
        if word & NOP_MASK != NOP_VALID {
            return None;
        }

        let field = |shift: u16| ((word >> shift) & FIELD_MASK) as u8;

        let config = Config {
            channel: Channel::try_from(field(MUX_SHIFT)).ok()?,
            mode: if word & TS_MODE_BIT != 0 {
                Mode::Temperature
            } else {
                Mode::Adc
            },
            range: Range::try_from(field(PGA_SHIFT)).ok()?,
            rate: DataRate::try_from(field(DR_SHIFT)).ok()?,
            dout_pull_up: word & PULL_UP_EN_BIT != 0,
        };

        let conversion = if word & MODE_BIT != 0 {
            ConversionMode::SingleShot
        } else {
            ConversionMode::Continuous
        };

        Some(Self {
            config,
            start: word & SS_BIT != 0,
            conversion,
        })
    }
}

/* ======== Conversion results ======== */

/// Converts a raw ADC code to volts for the given range
pub fn raw_to_voltage(raw: i16, range: Range) -> f32 {
    raw as f32 * range.full_scale_volts() / 32768.0
}

/// Converts a raw temperature-mode code to degrees Celsius. The reading is
/// left-justified in the top 14 bits at 0.03125°C per step.
pub fn raw_to_temperature(raw: i16) -> f32 {
    (raw >> 2) as f32 * 0.03125
}

/// What produced a raw sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Source {
    /// An analog input sampled at the given range
    Adc(Range),
    /// The internal temperature sensor
    Temperature,
}

/// A raw sample together with the setting that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Conversion {
    pub raw: i16,
    pub source: Source,
}

impl Conversion {
    /// The sample in volts, or `None` for a temperature sample
    pub fn volts(&self) -> Option<f32> {
        match self.source {
            Source::Adc(range) => Some(raw_to_voltage(self.raw, range)),
            Source::Temperature => None,
        }
    }

    /// The sample in degrees Celsius, or `None` for an ADC sample
    pub fn celsius(&self) -> Option<f32> {
        match self.source {
            Source::Adc(_) => None,
            Source::Temperature => Some(raw_to_temperature(self.raw)),
        }
    }
}

/* ======== Errors ======== */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The driver has not been initialized
    NotInitialized,
    /// `init` was called twice without a `deinit` in between
    AlreadyInitialized,
    /// A field code outside of its enumerated domain
    InvalidArgument,
    /// Single-shot and continuous operation were mixed up
    ModeConflict,
    /// The SPI transfer failed
    Transport(E),
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotInitialized => f.write_str("driver is not initialized"),
            Error::AlreadyInitialized => f.write_str("driver is already initialized"),
            Error::InvalidArgument => f.write_str("invalid argument"),
            Error::ModeConflict => f.write_str("single-shot and continuous mode conflict"),
            Error::Transport(e) => write!(f, "spi transport error: {e:?}"),
        }
    }
}

/* ======== ADS1118 ======== */

/// Lifecycle of the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    Uninitialized,
    /// Powered down between single-shot conversions, accepts configuration
    Ready,
    /// Converting continuously; reconfiguration requires a stop first
    Continuous,
}

pub struct ADS1118<SPI, D> {
    spi: SPI,
    delay: D,
    config: Config,
    state: State,
}

impl<SPI, D> ADS1118<SPI, D>
where
    SPI: ErrorType,
{
    /// Creates a driver with the default configuration. No bus traffic
    /// happens until [`ADS1118::init`].
    pub fn new(spi: SPI, delay: D) -> Self {
        Self::with_config(spi, delay, Config::default())
    }

    /// Creates a driver whose `init` will power up with `config`
    pub fn with_config(spi: SPI, delay: D, config: Config) -> Self {
        Self {
            spi,
            delay,
            config,
            state: State::Uninitialized,
        }
    }

    /// Gives back the SPI device and the delay
    pub fn release(self) -> (SPI, D) {
        (self.spi, self.delay)
    }

    pub fn state(&self) -> State {
        self.state
    }

    fn ensure_initialized(&self) -> Result<(), Error<SPI::Error>> {
        match self.state {
            State::Uninitialized => Err(Error::NotInitialized),
            _ => Ok(()),
        }
    }

    fn ensure_ready(&self) -> Result<(), Error<SPI::Error>> {
        match self.state {
            State::Uninitialized => Err(Error::NotInitialized),
            State::Ready => Ok(()),
            State::Continuous => Err(Error::ModeConflict),
        }
    }

    fn ensure_continuous(&self) -> Result<(), Error<SPI::Error>> {
        match self.state {
            State::Uninitialized => Err(Error::NotInitialized),
            State::Ready => Err(Error::ModeConflict),
            State::Continuous => Ok(()),
        }
    }

    /// Runs `update` on the cached config if the driver is ready and the
    /// argument converts
    fn update<T, V>(
        &mut self,
        value: V,
        update: impl FnOnce(&mut Config, T),
    ) -> Result<(), Error<SPI::Error>>
    where
        V: TryInto<T>,
    {
        self.ensure_ready()?;
        let value: T = value
            .try_into()
            .map_err(|_| Error::<SPI::Error>::InvalidArgument)?;
        update(&mut self.config, value);
        Ok(())
    }

    /// Selects the input multiplexer setting. Takes effect on the next
    /// conversion trigger.
    pub fn set_channel(&mut self, channel: impl TryInto<Channel>) -> Result<(), Error<SPI::Error>> {
        self.update(channel, |config, channel: Channel| config.channel = channel)
    }

    pub fn channel(&self) -> Result<Channel, Error<SPI::Error>> {
        self.ensure_initialized()?;
        Ok(self.config.channel)
    }

    /// Switches between sampling the inputs and the temperature sensor.
    /// Takes effect on the next conversion trigger.
    pub fn set_mode(&mut self, mode: impl TryInto<Mode>) -> Result<(), Error<SPI::Error>> {
        self.update(mode, |config, mode: Mode| config.mode = mode)
    }

    pub fn mode(&self) -> Result<Mode, Error<SPI::Error>> {
        self.ensure_initialized()?;
        Ok(self.config.mode)
    }

    /// Sets the full-scale range. Takes effect on the next conversion
    /// trigger.
    pub fn set_range(&mut self, range: impl TryInto<Range>) -> Result<(), Error<SPI::Error>> {
        self.update(range, |config, range: Range| config.range = range)
    }

    pub fn range(&self) -> Result<Range, Error<SPI::Error>> {
        self.ensure_initialized()?;
        Ok(self.config.range)
    }

    /// Sets the output data rate. Takes effect on the next conversion
    /// trigger.
    pub fn set_rate(&mut self, rate: impl TryInto<DataRate>) -> Result<(), Error<SPI::Error>> {
        self.update(rate, |config, rate: DataRate| config.rate = rate)
    }

    pub fn rate(&self) -> Result<DataRate, Error<SPI::Error>> {
        self.ensure_initialized()?;
        Ok(self.config.rate)
    }

    pub fn set_dout_pull_up(&mut self, enable: bool) -> Result<(), Error<SPI::Error>> {
        self.update(enable, |config, enable: bool| config.dout_pull_up = enable)
    }

    pub fn dout_pull_up(&self) -> Result<bool, Error<SPI::Error>> {
        self.ensure_initialized()?;
        Ok(self.config.dout_pull_up)
    }

    /// Replaces every cached field at once
    pub fn set_config(&mut self, config: Config) -> Result<(), Error<SPI::Error>> {
        self.update(config, |current, config: Config| *current = config)
    }

    pub fn config(&self) -> Result<Config, Error<SPI::Error>> {
        self.ensure_initialized()?;
        Ok(self.config)
    }

    /// Converts a raw temperature-mode sample to degrees Celsius
    pub fn temperature_convert(&self, raw: i16) -> Result<f32, Error<SPI::Error>> {
        self.ensure_initialized()?;
        Ok(raw_to_temperature(raw))
    }

    fn command(&self, start: bool, conversion: ConversionMode) -> Command {
        Command {
            config: self.config,
            start,
            conversion,
        }
    }

    /// Idle single-shot mode with no conversion pending
    fn power_down_command(&self) -> Command {
        self.command(false, ConversionMode::SingleShot)
    }

    fn single_shot_command(&self) -> Command {
        self.command(true, ConversionMode::SingleShot)
    }

    fn continuous_command(&self) -> Command {
        self.command(true, ConversionMode::Continuous)
    }

    fn source(&self) -> Source {
        match self.config.mode {
            Mode::Adc => Source::Adc(self.config.range),
            Mode::Temperature => Source::Temperature,
        }
    }

    fn conversion(&self, rx: [u8; 2]) -> Conversion {
        Conversion {
            raw: i16::from_be_bytes(rx),
            source: self.source(),
        }
    }
}

#[cfg_attr(not(feature = "defmt"), allow(unused_variables))]
fn transport_error<E>(e: E, what: &'static str) -> Error<E> {
    #[cfg(feature = "defmt")]
    defmt::warn!("ads1118: {} failed", what);

    Error::Transport(e)
}

impl<SPI, D> ADS1118<SPI, D>
where
    SPI: SpiDevice,
    D: DelayNs,
{
    /// Writes the cached configuration in power-down single-shot mode, which
    /// puts the device in a known state
    pub fn init(&mut self) -> Result<(), Error<SPI::Error>> {
        if self.state != State::Uninitialized {
            return Err(Error::AlreadyInitialized);
        }

        let command = self.power_down_command();
        self.exchange(command.to_bytes(), "init")?;
        self.state = State::Ready;

        #[cfg(feature = "defmt")]
        defmt::debug!("ads1118: initialized with config {:04x}", command.to_word());

        Ok(())
    }

    /// Stops continuous conversion if it is running, leaves the device
    /// powered down and marks the driver uninitialized
    pub fn deinit(&mut self) -> Result<(), Error<SPI::Error>> {
        self.ensure_initialized()?;

        self.exchange(self.power_down_command().to_bytes(), "deinit")?;
        self.state = State::Uninitialized;

        #[cfg(feature = "defmt")]
        defmt::debug!("ads1118: deinitialized");

        Ok(())
    }

    /// Triggers one conversion with the cached configuration, waits for it
    /// to finish and reads the result back.
    ///
    /// Callers of this function should note that it blocks for a full
    /// conversion period plus margin, up to ~139ms at 8 SPS.
    pub fn single_read(&mut self) -> Result<Conversion, Error<SPI::Error>> {
        self.ensure_ready()?;

        self.exchange(self.single_shot_command().to_bytes(), "single-shot trigger")?;
        self.delay.delay_us(self.config.rate.single_shot_wait_us());
        let rx = self.exchange(READ_ONLY_WORD, "single-shot read")?;

        Ok(self.conversion(rx))
    }

    /// Puts the device in continuous conversion mode with the cached
    /// configuration
    pub fn start_continuous_read(&mut self) -> Result<(), Error<SPI::Error>> {
        self.ensure_ready()?;

        self.exchange(self.continuous_command().to_bytes(), "continuous start")?;
        self.state = State::Continuous;

        #[cfg(feature = "defmt")]
        defmt::debug!("ads1118: continuous conversion started");

        Ok(())
    }

    /// Reads the most recently completed conversion without re-triggering.
    /// Reading faster than the data rate returns the same sample again.
    pub fn continuous_read(&mut self) -> Result<Conversion, Error<SPI::Error>> {
        self.ensure_continuous()?;

        let rx = self.exchange(READ_ONLY_WORD, "continuous read")?;

        Ok(self.conversion(rx))
    }

    /// Returns the device to power-down single-shot mode
    pub fn stop_continuous_read(&mut self) -> Result<(), Error<SPI::Error>> {
        self.ensure_continuous()?;

        self.exchange(self.power_down_command().to_bytes(), "continuous stop")?;
        self.state = State::Ready;

        #[cfg(feature = "defmt")]
        defmt::debug!("ads1118: continuous conversion stopped");

        Ok(())
    }

    /// One full-duplex 16-bit frame
    fn exchange(&mut self, tx: [u8; 2], what: &'static str) -> Result<[u8; 2], Error<SPI::Error>> {
        let mut rx = [0u8; 2];
        self.spi
            .transfer(&mut rx, &tx)
            .map_err(|e| transport_error(e, what))?;
        Ok(rx)
    }
}

#[cfg(feature = "embedded-hal-async")]
impl<SPI, D> ADS1118<SPI, D>
where
    SPI: embedded_hal_async::spi::SpiDevice,
    D: embedded_hal_async::delay::DelayNs,
{
    /// Writes the cached configuration in power-down single-shot mode
    /// asynchronously
    pub async fn init_async(&mut self) -> Result<(), Error<SPI::Error>> {
        if self.state != State::Uninitialized {
            return Err(Error::AlreadyInitialized);
        }

        let command = self.power_down_command();
        self.exchange_async(command.to_bytes(), "init").await?;
        self.state = State::Ready;

        #[cfg(feature = "defmt")]
        defmt::debug!("ads1118: initialized with config {:04x}", command.to_word());

        Ok(())
    }

    pub async fn deinit_async(&mut self) -> Result<(), Error<SPI::Error>> {
        self.ensure_initialized()?;

        let command = self.power_down_command();
        self.exchange_async(command.to_bytes(), "deinit").await?;
        self.state = State::Uninitialized;

        #[cfg(feature = "defmt")]
        defmt::debug!("ads1118: deinitialized");

        Ok(())
    }

    /// Triggers one conversion and reads the result asynchronously.
    ///
    /// The future resolves after a full conversion period plus margin, up to
    /// ~138ms at 8 SPS.
    pub async fn single_read_async(&mut self) -> Result<Conversion, Error<SPI::Error>> {
        self.ensure_ready()?;

        let command = self.single_shot_command();
        self.exchange_async(command.to_bytes(), "single-shot trigger")
            .await?;
        self.delay
            .delay_us(self.config.rate.single_shot_wait_us())
            .await;
        let rx = self
            .exchange_async(READ_ONLY_WORD, "single-shot read")
            .await?;

        Ok(self.conversion(rx))
    }

    pub async fn start_continuous_read_async(&mut self) -> Result<(), Error<SPI::Error>> {
        self.ensure_ready()?;

        let command = self.continuous_command();
        self.exchange_async(command.to_bytes(), "continuous start")
            .await?;
        self.state = State::Continuous;

        #[cfg(feature = "defmt")]
        defmt::debug!("ads1118: continuous conversion started");

        Ok(())
    }

    pub async fn continuous_read_async(&mut self) -> Result<Conversion, Error<SPI::Error>> {
        self.ensure_continuous()?;

        let rx = self
            .exchange_async(READ_ONLY_WORD, "continuous read")
            .await?;

        Ok(self.conversion(rx))
    }

    pub async fn stop_continuous_read_async(&mut self) -> Result<(), Error<SPI::Error>> {
        self.ensure_continuous()?;

        let command = self.power_down_command();
        self.exchange_async(command.to_bytes(), "continuous stop")
            .await?;
        self.state = State::Ready;

        #[cfg(feature = "defmt")]
        defmt::debug!("ads1118: continuous conversion stopped");

        Ok(())
    }

    async fn exchange_async(
        &mut self,
        tx: [u8; 2],
        what: &'static str,
    ) -> Result<[u8; 2], Error<SPI::Error>> {
        let mut rx = [0u8; 2];
        self.spi
            .transfer(&mut rx, &tx)
            .await
            .map_err(|e| transport_error(e, what))?;
        Ok(rx)
    }
}
