use std::cell::RefCell;

/// Ambient section context: the pipeline name and explicit section path a resolution call runs
/// under.
///
/// The original implementation this crate is modeled on keeps this as process-global state
/// pushed and popped around a `with` block. Per the re-architecture noted in the top-level
/// spec, `SectionContext` is instead an explicit value threaded through every resolver call;
/// [`ContextStack`] below is an opt-in convenience for callers that still want push/pop
/// ergonomics (e.g. a pipeline runner wrapping many resolver calls in one ambient scope).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionContext {
    pub pipeline_name: Option<String>,
    pub sections: Vec<String>,
}

impl SectionContext {
    pub fn new(pipeline_name: Option<impl Into<String>>, sections: Vec<String>) -> Self {
        SectionContext {
            pipeline_name: pipeline_name.map(Into::into),
            sections,
        }
    }

    /// Fills in `pipeline_name`/`sections` from `other` wherever this context leaves them
    /// unset, mirroring the default merge style of the original `inject_section` helper.
    pub fn merge(&mut self, other: &SectionContext) {
        if self.pipeline_name.is_none() {
            self.pipeline_name = other.pipeline_name.clone();
        }
        if self.sections.is_empty() {
            self.sections = other.sections.clone();
        }
    }

    pub fn section_refs(&self) -> Vec<&str> {
        self.sections.iter().map(String::as_str).collect()
    }
}

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<SectionContext>> = const { RefCell::new(Vec::new()) };
}

/// A scoped-acquisition guard: while alive, [`ContextStack::current`] returns the context it was
/// constructed with (merged with whatever was already on the stack). Dropping the guard pops it.
pub struct ContextGuard {
    _private: (),
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        CONTEXT_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Thread-local convenience stack for operators who prefer push/pop over threading a
/// [`SectionContext`] through every call explicitly.
pub struct ContextStack;

impl ContextStack {
    /// Pushes `section_context` (merged with the current top-of-stack context, if any) and
    /// returns a guard that pops it again on drop.
    pub fn inject(mut section_context: SectionContext, merge_existing: bool) -> ContextGuard {
        if merge_existing {
            if let Some(existing) = Self::current() {
                section_context.merge(&existing);
            }
        }
        CONTEXT_STACK.with(|stack| stack.borrow_mut().push(section_context));
        ContextGuard { _private: () }
    }

    pub fn current() -> Option<SectionContext> {
        CONTEXT_STACK.with(|stack| stack.borrow().last().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_restores_previous_context_on_drop() {
        assert_eq!(ContextStack::current(), None);
        {
            let _outer = ContextStack::inject(
                SectionContext::new(Some("pipe"), vec!["db".into()]),
                true,
            );
            assert_eq!(ContextStack::current().unwrap().pipeline_name.as_deref(), Some("pipe"));
            {
                let _inner = ContextStack::inject(SectionContext::new::<&str>(None, vec![]), true);
                // merged: inherits pipeline_name from outer since inner left it unset.
                assert_eq!(
                    ContextStack::current().unwrap().pipeline_name.as_deref(),
                    Some("pipe")
                );
            }
            assert_eq!(ContextStack::current().unwrap().pipeline_name.as_deref(), Some("pipe"));
        }
        assert_eq!(ContextStack::current(), None);
    }
}
