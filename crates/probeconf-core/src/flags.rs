//! Ambient compiler and linker flags.
//!
//! A probe temporarily adds library and include flags while it tests a
//! candidate. It does so through a [`FlagScope`], which restores the
//! previous flags when dropped, so every exit path (success, failure, `?`,
//! unwinding) leaves the context as it found it.

use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};

/// Flags handed to every toolchain invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlagContext {
    pub cppflags: Vec<String>,
    pub cflags: Vec<String>,
    pub ldflags: Vec<String>,
    pub libs: Vec<String>,
}

impl FlagContext {
    /// Start a scope whose changes are undone when it is dropped.
    pub fn scoped(&mut self) -> FlagScope<'_> {
        let saved = self.clone();
        FlagScope {
            flags: self,
            saved: Some(saved),
        }
    }

    /// Put `args` in front of the current libraries.
    pub fn prepend_libs<I, S>(&mut self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut libs: Vec<String> = args.into_iter().map(Into::into).collect();
        libs.append(&mut self.libs);
        self.libs = libs;
    }

    pub fn append_cppflags<I, S>(&mut self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cppflags.extend(args.into_iter().map(Into::into));
    }

    /// Compiler arguments for a compile-and-link invocation, in order.
    pub fn compile_args(&self) -> Vec<String> {
        self.cppflags
            .iter()
            .chain(&self.cflags)
            .cloned()
            .collect()
    }

    /// Linker arguments placed after the source file, in order.
    pub fn link_args(&self) -> Vec<String> {
        self.ldflags.iter().chain(&self.libs).cloned().collect()
    }
}

/// Temporary changes to a [`FlagContext`].
#[derive(Debug)]
pub struct FlagScope<'a> {
    flags: &'a mut FlagContext,
    saved: Option<FlagContext>,
}

impl Deref for FlagScope<'_> {
    type Target = FlagContext;

    fn deref(&self) -> &Self::Target {
        self.flags
    }
}

impl DerefMut for FlagScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.flags
    }
}

impl Drop for FlagScope<'_> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            *self.flags = saved;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> FlagContext {
        FlagContext {
            cppflags: vec!["-DNDEBUG".into()],
            cflags: vec!["-O2".into()],
            ldflags: vec![],
            libs: vec!["-lm".into()],
        }
    }

    #[test]
    fn test_scope_restores_on_drop() {
        let mut flags = base();
        {
            let mut scope = flags.scoped();
            scope.prepend_libs(["-L/opt/mpich/lib", "-lmpich"]);
            scope.append_cppflags(["-I/opt/mpich/include"]);
            assert_eq!(scope.libs, vec!["-L/opt/mpich/lib", "-lmpich", "-lm"]);
        }
        assert_eq!(flags, base());
    }

    #[test]
    fn test_scope_restores_on_early_return() {
        fn failing(flags: &mut FlagContext) -> Result<(), String> {
            let mut scope = flags.scoped();
            scope.prepend_libs(["-lbroken"]);
            let link: Result<(), String> = Err("link failed".to_string());
            link?;
            Ok(())
        }

        let mut flags = base();
        assert!(failing(&mut flags).is_err());
        assert_eq!(flags, base());
    }

    #[test]
    fn test_scope_restores_on_unwind() {
        let mut flags = base();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut scope = flags.scoped();
            scope.append_cppflags(["-I/tmp"]);
            panic!("compiler crashed");
        }));
        assert!(result.is_err());
        assert_eq!(flags, base());
    }

    #[test]
    fn test_nested_scopes() {
        let mut flags = base();
        {
            let mut outer = flags.scoped();
            outer.prepend_libs(["-lblas"]);
            {
                let mut inner = outer.scoped();
                inner.prepend_libs(["-llapack"]);
                assert_eq!(inner.libs, vec!["-llapack", "-lblas", "-lm"]);
            }
            assert_eq!(outer.libs, vec!["-lblas", "-lm"]);
        }
        assert_eq!(flags, base());
    }

    #[test]
    fn test_argument_order() {
        let flags = base();
        assert_eq!(flags.compile_args(), vec!["-DNDEBUG", "-O2"]);
        assert_eq!(flags.link_args(), vec!["-lm"]);
    }
}
