/// Vulkan Debug Messenger - routes validation layer messages into the framechain logger
///
/// Per-messenger state (statistics and repeated-message tracking) is handed to
/// the driver through `p_user_data` and lives as long as the messenger.

use ash::vk;
use colored::*;
use framechain::{render_error, render_info, render_trace, render_warn, DebugSeverity, Error, Result};
use rustc_hash::FxHashMap;
use std::ffi::CStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use crate::vulkan_format::status_code;

const VALIDATION_SOURCE: &str = "framechain::vulkan::validation";

/// Counters of validation messages received, by severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationStats {
    pub errors: u32,
    pub warnings: u32,
    pub info: u32,
    pub verbose: u32,
}

impl ValidationStats {
    pub fn total(&self) -> u32 {
        self.errors + self.warnings + self.info + self.verbose
    }
}

/// Callback state shared with the driver
struct DebugState {
    errors: AtomicU32,
    warnings: AtomicU32,
    info: AtomicU32,
    verbose: AtomicU32,
    /// Occurrences per message id, for grouping repeated messages
    messages: Mutex<FxHashMap<String, u32>>,
}

impl DebugState {
    fn new() -> Self {
        Self {
            errors: AtomicU32::new(0),
            warnings: AtomicU32::new(0),
            info: AtomicU32::new(0),
            verbose: AtomicU32::new(0),
            messages: Mutex::new(FxHashMap::default()),
        }
    }

    fn count(&self, severity: vk::DebugUtilsMessageSeverityFlagsEXT) {
        let counter = if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
            &self.errors
        } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
            &self.warnings
        } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
            &self.info
        } else {
            &self.verbose
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one occurrence of `message_id` and return how many were seen
    fn track(&self, message_id: &str) -> u32 {
        match self.messages.lock() {
            Ok(mut messages) => {
                let count = messages.entry(message_id.to_string()).or_insert(0);
                *count += 1;
                *count
            }
            Err(_) => 1,
        }
    }

    fn stats(&self) -> ValidationStats {
        ValidationStats {
            errors: self.errors.load(Ordering::Relaxed),
            warnings: self.warnings.load(Ordering::Relaxed),
            info: self.info.load(Ordering::Relaxed),
            verbose: self.verbose.load(Ordering::Relaxed),
        }
    }

    fn repeated_messages(&self) -> usize {
        self.messages
            .lock()
            .map(|messages| messages.values().filter(|&&count| count > 1).count())
            .unwrap_or(0)
    }
}

/// Severity flags requested from the validation layers
pub(crate) fn severity_flags(severity: DebugSeverity) -> vk::DebugUtilsMessageSeverityFlagsEXT {
    match severity {
        DebugSeverity::ErrorsOnly => vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        DebugSeverity::ErrorsAndWarnings => {
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
        }
        DebugSeverity::All => {
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                | vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
        }
    }
}

fn message_type_name(message_type: vk::DebugUtilsMessageTypeFlagsEXT) -> &'static str {
    if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        "Validation"
    } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        "Performance"
    } else {
        "General"
    }
}

unsafe fn c_str_or<'a>(ptr: *const std::os::raw::c_char, fallback: &'a str) -> std::borrow::Cow<'a, str> {
    if ptr.is_null() {
        std::borrow::Cow::Borrowed(fallback)
    } else {
        CStr::from_ptr(ptr).to_string_lossy()
    }
}

/// Vulkan debug messenger callback
///
/// Forwards each message to the framechain logger with a matching severity.
unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    p_user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() {
        return vk::FALSE;
    }
    let callback_data = &*p_callback_data;
    let message_id = c_str_or(callback_data.p_message_id_name, "Unknown");
    let message = c_str_or(callback_data.p_message, "No message");
    let type_str = message_type_name(message_type);

    let occurrences = match (p_user_data as *const DebugState).as_ref() {
        Some(state) => {
            state.count(message_severity);
            state.track(&message_id)
        }
        None => 1,
    };
    let repeat = if occurrences > 1 {
        format!(" [x{}]", occurrences)
    } else {
        String::new()
    };

    if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        render_error!(VALIDATION_SOURCE, "[{}]{} {}: {}", type_str, repeat, message_id, message);
    } else if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        render_warn!(VALIDATION_SOURCE, "[{}]{} {}: {}", type_str, repeat, message_id, message);
    } else if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        render_info!(VALIDATION_SOURCE, "[{}]{} {}: {}", type_str, repeat, message_id, message);
    } else {
        render_trace!(VALIDATION_SOURCE, "[{}]{} {}: {}", type_str, repeat, message_id, message);
    }

    vk::FALSE // Don't abort Vulkan execution
}

/// Debug utils messenger, destroyed when dropped
///
/// Must be dropped before the instance it was created from.
pub struct DebugMessenger {
    loader: ash::ext::debug_utils::Instance,
    messenger: vk::DebugUtilsMessengerEXT,
    /// Pointed to by the messenger's user data
    state: Box<DebugState>,
}

impl DebugMessenger {
    pub(crate) fn new(entry: &ash::Entry, instance: &ash::Instance, severity: DebugSeverity) -> Result<Self> {
        let loader = ash::ext::debug_utils::Instance::new(entry, instance);
        let state = Box::new(DebugState::new());

        let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
            .message_severity(severity_flags(severity))
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(vulkan_debug_callback))
            .user_data(&*state as *const DebugState as *mut std::os::raw::c_void);

        let messenger = unsafe { loader.create_debug_utils_messenger(&debug_info, None) }.map_err(|e| {
            render_error!("framechain::vulkan", "Failed to create debug messenger: {:?}", e);
            Error::backend("vkCreateDebugUtilsMessengerEXT", status_code(e))
        })?;

        Ok(Self {
            loader,
            messenger,
            state,
        })
    }

    /// Validation messages received so far
    pub fn stats(&self) -> ValidationStats {
        self.state.stats()
    }

    /// Print a colored summary of the validation messages received
    pub fn print_stats_report(&self) {
        let stats = self.stats();

        if stats.total() == 0 {
            println!("\n{}", "✓ No validation messages".green().bold());
            return;
        }

        println!("\n{}", "=== Validation Statistics Report ===".bright_blue().bold());

        if stats.errors > 0 {
            println!("  {} {}", "Errors:".red().bold(), stats.errors);
        }
        if stats.warnings > 0 {
            println!("  {} {}", "Warnings:".yellow().bold(), stats.warnings);
        }
        if stats.info > 0 {
            println!("  {} {}", "Info:".cyan(), stats.info);
        }
        if stats.verbose > 0 {
            println!("  {} {}", "Verbose:".bright_black(), stats.verbose);
        }

        println!("  {} {}", "Total:".white().bold(), stats.total());

        let repeated = self.state.repeated_messages();
        if repeated > 0 {
            println!("\n  {} {} message(s) appeared multiple times", "ℹ".cyan(), repeated);
        }

        println!("{}\n", "====================================".bright_blue().bold());
    }
}

impl Drop for DebugMessenger {
    fn drop(&mut self) {
        unsafe {
            self.loader.destroy_debug_utils_messenger(self.messenger, None);
        }
    }
}
