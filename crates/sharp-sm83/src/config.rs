//! CPU model configuration.

/// Hardware revisions that differ in their post-boot register values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Model {
    /// Original monochrome handheld.
    #[default]
    Dmg,
    /// Pocket revision. Same CPU, A reads 0xFF after boot.
    Mgb,
    /// Colour revision. A reads 0x11 after boot, which games test for.
    Cgb,
}

/// Configuration for creating an [`crate::Sm83`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sm83Config {
    pub model: Model,
    /// Start with the registers the boot ROM leaves behind (PC = 0x0100).
    /// When false, every register is zero and execution starts at 0x0000,
    /// which is where a boot ROM image must be mapped.
    pub skip_boot: bool,
    /// Record executed instructions into the trace buffer from the start.
    pub trace: bool,
}

impl Default for Sm83Config {
    fn default() -> Self {
        Self {
            model: Model::Dmg,
            skip_boot: true,
            trace: false,
        }
    }
}
