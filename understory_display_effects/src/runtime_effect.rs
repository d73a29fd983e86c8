// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt::Debug;

use crate::{ColorSource, EffectError};

/// A compiled user shader program.
///
/// The program itself is opaque. Display lists only hold on to it and pass it
/// back to whoever renders them.
pub trait RuntimeEffect: Debug + Send + Sync {
    /// Number of bytes of uniform data the program expects.
    fn uniform_size(&self) -> usize;

    /// Number of child shader slots the program samples from.
    fn child_count(&self) -> usize {
        0
    }
}

/// A runtime effect bound to its uniforms and child samplers.
///
/// Shared by runtime color sources, runtime image filters and runtime
/// blenders.
#[derive(Clone, Debug)]
pub struct RuntimeEffectInstance {
    effect: Arc<dyn RuntimeEffect>,
    samplers: Vec<Option<Arc<ColorSource>>>,
    uniforms: Arc<[u8]>,
}

impl RuntimeEffectInstance {
    /// Binds an effect to its inputs.
    ///
    /// Fails when the uniform buffer does not match the program's declared
    /// size or the number of samplers does not match its child count.
    pub fn new(
        effect: Arc<dyn RuntimeEffect>,
        samplers: Vec<Option<Arc<ColorSource>>>,
        uniforms: Arc<[u8]>,
    ) -> Result<Self, EffectError> {
        if uniforms.len() != effect.uniform_size() {
            return Err(EffectError::UniformSize {
                expected: effect.uniform_size(),
                actual: uniforms.len(),
            });
        }
        if samplers.len() != effect.child_count() {
            return Err(EffectError::SamplerCount {
                expected: effect.child_count(),
                actual: samplers.len(),
            });
        }
        Ok(Self {
            effect,
            samplers,
            uniforms,
        })
    }

    /// The program.
    pub fn effect(&self) -> &Arc<dyn RuntimeEffect> {
        &self.effect
    }

    /// Child samplers, one per program slot. Empty slots are `None`.
    pub fn samplers(&self) -> &[Option<Arc<ColorSource>>] {
        &self.samplers
    }

    /// Raw uniform bytes.
    pub fn uniforms(&self) -> &[u8] {
        &self.uniforms
    }

    /// Whether every child sampler is safe to use off the UI thread.
    pub fn is_ui_thread_safe(&self) -> bool {
        self.samplers
            .iter()
            .flatten()
            .all(|sampler| sampler.is_ui_thread_safe())
    }
}

impl PartialEq for RuntimeEffectInstance {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.effect, &other.effect)
            && self.uniforms == other.uniforms
            && self.samplers == other.samplers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Color;
    use alloc::vec;

    #[derive(Debug)]
    struct Program {
        uniforms: usize,
        children: usize,
    }

    impl RuntimeEffect for Program {
        fn uniform_size(&self) -> usize {
            self.uniforms
        }

        fn child_count(&self) -> usize {
            self.children
        }
    }

    #[test]
    fn binding_checks_declared_sizes() {
        let program: Arc<dyn RuntimeEffect> = Arc::new(Program {
            uniforms: 8,
            children: 1,
        });
        let short = RuntimeEffectInstance::new(program.clone(), vec![None], Arc::from([0_u8; 4]));
        assert_eq!(
            short.unwrap_err(),
            EffectError::UniformSize {
                expected: 8,
                actual: 4
            }
        );
        let missing = RuntimeEffectInstance::new(program, Vec::new(), Arc::from([0_u8; 8]));
        assert!(matches!(missing, Err(EffectError::SamplerCount { .. })));
    }

    #[test]
    fn equality_is_program_identity_plus_inputs() {
        let program: Arc<dyn RuntimeEffect> = Arc::new(Program {
            uniforms: 4,
            children: 1,
        });
        let sampler = Some(Arc::new(ColorSource::Color(Color::RED)));
        let a =
            RuntimeEffectInstance::new(program.clone(), vec![sampler.clone()], Arc::from([1_u8; 4]))
                .unwrap();
        let b = RuntimeEffectInstance::new(program.clone(), vec![sampler], Arc::from([1_u8; 4]))
            .unwrap();
        assert_eq!(a, b);
        let other_program: Arc<dyn RuntimeEffect> = Arc::new(Program {
            uniforms: 4,
            children: 1,
        });
        let c =
            RuntimeEffectInstance::new(other_program, vec![None], Arc::from([1_u8; 4])).unwrap();
        assert_ne!(a, c);
        assert!(a.is_ui_thread_safe());
    }
}
