//! Shader module management
//!
//! Loads SPIR-V bytecode from disk and wraps `vk::ShaderModule` creation.
//! Modules are transient: once a pipeline is built they can be dropped.

use ash::{vk, Device};
use std::ffi::CStr;
use std::path::Path;

use crate::render::vulkan::{VulkanError, VulkanResult};

/// Entry point shared by all engine shaders
const SHADER_ENTRY_POINT: &CStr =
    unsafe { CStr::from_bytes_with_nul_unchecked(b"main\0") };

/// SPIR-V shader module with RAII cleanup
pub struct ShaderModule {
    device: Device,
    handle: vk::ShaderModule,
    stage: vk::ShaderStageFlags,
}

impl ShaderModule {
    /// Create a shader module from SPIR-V bytes.
    ///
    /// The byte slice must be a whole number of 32-bit words and properly
    /// aligned, which is what a SPIR-V compiler emits.
    pub fn from_bytes(
        device: &Device,
        bytes: &[u8],
        stage: vk::ShaderStageFlags,
    ) -> VulkanResult<Self> {
        let (prefix, words, suffix) = unsafe { bytes.align_to::<u32>() };
        if !prefix.is_empty() || !suffix.is_empty() {
            return Err(VulkanError::InvalidOperation {
                reason: format!("SPIR-V bytecode is misaligned ({} bytes)", bytes.len()),
            });
        }

        let create_info = vk::ShaderModuleCreateInfo::builder().code(words);
        let handle = unsafe {
            device
                .create_shader_module(&create_info, None)
                .map_err(VulkanError::Api)?
        };

        Ok(Self {
            device: device.clone(),
            handle,
            stage,
        })
    }

    /// Load a shader module from a SPIR-V file on disk
    pub fn from_file(
        device: &Device,
        path: &Path,
        stage: vk::ShaderStageFlags,
    ) -> VulkanResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| VulkanError::InvalidOperation {
            reason: format!("failed to read shader {}: {e}", path.display()),
        })?;
        log::debug!("loaded shader {} ({} bytes)", path.display(), bytes.len());
        Self::from_bytes(device, &bytes, stage)
    }

    /// Raw shader module handle
    pub fn handle(&self) -> vk::ShaderModule {
        self.handle
    }

    /// Stage create info for pipeline assembly
    pub fn stage_info(&self) -> vk::PipelineShaderStageCreateInfo {
        vk::PipelineShaderStageCreateInfo::builder()
            .stage(self.stage)
            .module(self.handle)
            .name(SHADER_ENTRY_POINT)
            .build()
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_shader_module(self.handle, None);
        }
    }
}
