// ABOUTME: Diagnostics accumulator for non-fatal warnings during a build.
// ABOUTME: Collects warnings that shouldn't fail a deployment but should be shown to users.

/// Collects non-fatal warnings during build operations.
#[derive(Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// A non-fatal warning collected during a build.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// Dependencies were installed on a host that differs from the target platform.
    pub fn native_extensions(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::NativeExtensions,
            message: message.into(),
        }
    }

    /// A post-install hook was present but could not be run.
    pub fn hook_skipped(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::HookSkipped,
            message: message.into(),
        }
    }
}

/// Categories of warnings that can occur during a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Native modules may not load on the target platform.
    NativeExtensions,
    /// post_install.sh exists but is not executable.
    HookSkipped,
}
