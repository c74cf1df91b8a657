//! One-shot hardware peripheral initialization.
//!
//! Configures the water-level ADC channel, the probe power output and the
//! flow-sensor interrupt using raw ESP-IDF sys calls. Called once from
//! `main()` before the monitor loop starts.
//!
//! The 1-Wire data line is not touched here: it is owned by a HAL
//! `PinDriver` so the bus driver can use the `embedded-hal` traits.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU64, Ordering};

#[cfg(target_os = "espidf")]
use crate::error::SensorError;
#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
    OneWirePinFailed,
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={rc})"),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={rc})"),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={rc})"),
            Self::OneWirePinFailed => write!(f, "1-Wire pin could not be claimed"),
        }
    }
}

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the monitor loop; single-threaded.
    unsafe {
        init_adc()?;
        init_probe_power()?;
        init_flow_input()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: Must be called only from the single-threaded init path or the
/// main-loop ADC read path. `init_adc()` completes before the loop starts.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    esp!(unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) })
        .map_err(|e| HwInitError::AdcInitFailed(e.code()))?;

    // 12 dB attenuation gives the full 0..3.3 V probe swing.
    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    esp!(unsafe {
        adc_oneshot_config_channel(adc1_handle(), pins::WATER_SIGNAL_ADC1_CHANNEL, &chan_cfg)
    })
    .map_err(|e| HwInitError::AdcInitFailed(e.code()))?;

    info!(
        "hw_init: ADC1 CH{} configured (GPIO{} water level)",
        pins::WATER_SIGNAL_ADC1_CHANNEL,
        pins::WATER_SIGNAL_GPIO
    );
    Ok(())
}

/// Single 12-bit conversion.
#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> Result<u16, SensorError> {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract, single-threaded main-loop access only.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return Err(SensorError::AdcReadFailed(ret));
    }
    Ok(raw.clamp(0, 4095) as u16)
}

// ── GPIO Outputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_probe_power() -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::WATER_POWER_GPIO,
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    esp!(unsafe { gpio_config(&cfg) }).map_err(|e| HwInitError::GpioConfigFailed(e.code()))?;
    // Probe starts de-energised.
    unsafe { gpio_set_level(pins::WATER_POWER_GPIO, 0) };

    info!("hw_init: GPIO{} probe power output (low)", pins::WATER_POWER_GPIO);
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: gpio_set_level writes to an output configured in
    // init_probe_power(). Main-loop only.
    unsafe {
        gpio_set_level(pin, u32::from(high));
    }
}

#[cfg(not(target_os = "espidf"))]
static SIM_OUTPUTS: AtomicU64 = AtomicU64::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(pin: i32, high: bool) {
    let bit = 1u64 << pin;
    if high {
        SIM_OUTPUTS.fetch_or(bit, Ordering::Relaxed);
    } else {
        SIM_OUTPUTS.fetch_and(!bit, Ordering::Relaxed);
    }
}

/// Last level written to a simulated output.
#[cfg(not(target_os = "espidf"))]
pub fn gpio_output_level(pin: i32) -> bool {
    SIM_OUTPUTS.load(Ordering::Relaxed) & (1u64 << pin) != 0
}

// ── GPIO Inputs ───────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_flow_input() -> Result<(), HwInitError> {
    // Open-collector hall output: pull-up, count rising edges.
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::FLOW_PULSE_GPIO,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_POSEDGE,
    };
    esp!(unsafe { gpio_config(&cfg) }).map_err(|e| HwInitError::GpioConfigFailed(e.code()))?;

    info!("hw_init: GPIO{} flow input (pull-up, rising edge)", pins::FLOW_PULSE_GPIO);
    Ok(())
}

// ── GPIO ISR Service ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe extern "C" fn flow_gpio_isr(_arg: *mut core::ffi::c_void) {
    crate::sensors::flow::flow_isr_handler();
}

/// Install the per-pin GPIO ISR service and register the flow handler.
/// Call after init_peripherals().
#[cfg(target_os = "espidf")]
pub fn init_isr_service() -> Result<(), HwInitError> {
    // SAFETY: ESP_ERR_INVALID_STATE means the service is already installed
    // (acceptable). The handler only touches a lock-free atomic counter.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        esp!(gpio_isr_handler_add(
            pins::FLOW_PULSE_GPIO,
            Some(flow_gpio_isr),
            core::ptr::null_mut(),
        ))
        .map_err(|e| HwInitError::IsrInstallFailed(e.code()))?;
        esp!(gpio_intr_enable(pins::FLOW_PULSE_GPIO))
            .map_err(|e| HwInitError::IsrInstallFailed(e.code()))?;
    }
    info!("hw_init: ISR service installed (flow)");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}
