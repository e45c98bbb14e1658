//! Authentication boundary.
//!
//! The session never signs anyone in. It only asks an `AuthGate` whether a
//! user is present and, when one is not, asks it to prompt for login.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

use crate::remote::User;

/// Gate consulted before every authenticated action
pub trait AuthGate: Send + Sync {
    /// The signed-in user, if any
    fn current_user(&self) -> Option<User>;

    /// Ask the surrounding UI to start a login flow
    fn open_login_prompt(&self);

    fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }
}

type PromptHook = Box<dyn Fn() + Send + Sync>;

/// In-process auth state: a user slot plus a login-prompt hook.
#[derive(Default)]
pub struct UserSlot {
    user: RwLock<Option<User>>,
    prompts: AtomicUsize,
    on_prompt: Option<PromptHook>,
}

impl UserSlot {
    pub fn new(user: Option<User>) -> Self {
        Self {
            user: RwLock::new(user),
            prompts: AtomicUsize::new(0),
            on_prompt: None,
        }
    }

    pub fn anonymous() -> Self {
        Self::new(None)
    }

    /// Run `hook` every time a login prompt is requested
    pub fn with_prompt_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_prompt = Some(Box::new(hook));
        self
    }

    pub fn sign_in(&self, user: User) {
        *self.user.write() = Some(user);
    }

    pub fn sign_out(&self) {
        *self.user.write() = None;
    }

    /// Number of login prompts requested so far
    pub fn prompt_count(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }
}

impl AuthGate for UserSlot {
    fn current_user(&self) -> Option<User> {
        self.user.read().clone()
    }

    fn open_login_prompt(&self) {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        if let Some(hook) = &self.on_prompt {
            hook();
        }
    }
}
