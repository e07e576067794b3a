/*
 * The application object: owner of the active visual theme and the registry
 * of top-level windows. Exactly one application may be current per UI
 * thread. `Application::new` installs it, `dispose` clears it, and the tree
 * consults it to resolve the default handler factory.
 *
 * Changing the visual theme recreates the handlers of every registered window
 * subtree so each control ends up bound to a peer from the new factory.
 */

use crate::control_tree::ControlTree;
use crate::error::{PlatformError, Result as PlatformResult};
use crate::handler::HandlerFactory;
use crate::types::ControlId;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A named source of handler factories.
#[derive(Clone)]
pub struct VisualTheme {
    name: String,
    factory: Rc<dyn HandlerFactory>,
}

impl VisualTheme {
    pub fn new(name: impl Into<String>, factory: Rc<dyn HandlerFactory>) -> Self {
        Self {
            name: name.into(),
            factory,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handler_factory(&self) -> Rc<dyn HandlerFactory> {
        self.factory.clone()
    }
}

impl PartialEq for VisualTheme {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && std::ptr::addr_eq(Rc::as_ptr(&self.factory), Rc::as_ptr(&other.factory))
    }
}

impl fmt::Debug for VisualTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisualTheme")
            .field("name", &self.name)
            .field("factory", &self.factory.name())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ApplicationConfig {
    pub app_name: String,
    pub visual_theme: VisualTheme,
}

type ThemeListener = Rc<RefCell<dyn FnMut(&mut ControlTree, &VisualTheme)>>;

struct ApplicationState {
    app_name: String,
    visual_theme: VisualTheme,
    windows: Vec<ControlId>,
    theme_listeners: Vec<ThemeListener>,
    disposed: bool,
}

thread_local! {
    static CURRENT_APPLICATION: RefCell<Option<Application>> = const { RefCell::new(None) };
}

/// Cheap handle to the shared application state.
#[derive(Clone)]
pub struct Application {
    state: Rc<RefCell<ApplicationState>>,
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Application")
            .field("app_name", &state.app_name)
            .field("visual_theme", &state.visual_theme)
            .field("windows", &state.windows)
            .field("disposed", &state.disposed)
            .finish()
    }
}

impl Application {
    /// Creates the application and makes it current on this thread.
    pub fn new(config: ApplicationConfig) -> PlatformResult<Self> {
        if let Some(existing) = Self::try_current() {
            return Err(PlatformError::InvalidOperation(format!(
                "application '{}' is already current on this thread",
                existing.app_name()
            )));
        }
        let app = Application {
            state: Rc::new(RefCell::new(ApplicationState {
                app_name: config.app_name,
                visual_theme: config.visual_theme,
                windows: Vec::new(),
                theme_listeners: Vec::new(),
                disposed: false,
            })),
        };
        CURRENT_APPLICATION.with(|current| *current.borrow_mut() = Some(app.clone()));
        log::debug!(
            "Application: '{}' started with theme '{}'",
            app.app_name(),
            app.visual_theme().name()
        );
        Ok(app)
    }

    pub fn current() -> PlatformResult<Self> {
        Self::try_current().ok_or_else(|| {
            PlatformError::InvalidOperation("no application is current on this thread".to_string())
        })
    }

    pub fn try_current() -> Option<Self> {
        CURRENT_APPLICATION.with(|current| current.borrow().clone())
    }

    pub fn app_name(&self) -> String {
        self.state.borrow().app_name.clone()
    }

    pub fn visual_theme(&self) -> VisualTheme {
        self.state.borrow().visual_theme.clone()
    }

    /// Live top-level windows, in creation order.
    pub fn windows(&self) -> Vec<ControlId> {
        self.state.borrow().windows.clone()
    }

    pub fn is_disposed(&self) -> bool {
        self.state.borrow().disposed
    }

    pub(crate) fn register_window(&self, window: ControlId) {
        let mut state = self.state.borrow_mut();
        if !state.windows.contains(&window) {
            state.windows.push(window);
        }
    }

    pub(crate) fn unregister_window(&self, window: ControlId) {
        self.state.borrow_mut().windows.retain(|w| *w != window);
    }

    /// Listeners receive the tree the theme was switched on and may switch it again.
    pub fn on_visual_theme_changed(
        &self,
        listener: impl FnMut(&mut ControlTree, &VisualTheme) + 'static,
    ) {
        self.state
            .borrow_mut()
            .theme_listeners
            .push(Rc::new(RefCell::new(listener)));
    }

    /*
     * Switches the visual theme. Setting the theme already in use does
     * nothing. Otherwise every registered window subtree gets fresh handlers
     * from the new factory before the change listeners run. A listener that
     * switches the theme again supersedes this change: the remaining
     * listeners only hear about the newer theme.
     */
    pub fn set_visual_theme(&self, tree: &mut ControlTree, theme: VisualTheme) -> PlatformResult<()> {
        let windows = {
            let mut state = self.state.borrow_mut();
            if state.disposed {
                return Err(PlatformError::Disposed(format!(
                    "application '{}' is disposed",
                    state.app_name
                )));
            }
            if state.visual_theme == theme {
                return Ok(());
            }
            log::debug!(
                "Application: visual theme '{}' -> '{}'",
                state.visual_theme.name(),
                theme.name()
            );
            state.visual_theme = theme.clone();
            state.windows.clone()
        };

        for window in windows {
            if tree.is_disposed(window).unwrap_or(true) {
                continue;
            }
            tree.recreate_all_handlers(window)?;
        }

        let listeners = self.state.borrow().theme_listeners.clone();
        for listener in listeners {
            if self.state.borrow().visual_theme != theme {
                log::debug!(
                    "Application: theme '{}' superseded while notifying listeners",
                    theme.name()
                );
                break;
            }
            match listener.try_borrow_mut() {
                Ok(mut listener) => (*listener)(tree, &theme),
                Err(_) => log::warn!(
                    "Application: theme listener re-entered while switching to '{}', skipped",
                    theme.name()
                ),
            }
        }
        Ok(())
    }

    /// Ends the application; it stops being current on this thread.
    pub fn dispose(&self) {
        {
            let mut state = self.state.borrow_mut();
            if state.disposed {
                return;
            }
            state.disposed = true;
            state.windows.clear();
            state.theme_listeners.clear();
        }
        CURRENT_APPLICATION.with(|current| {
            let mut current = current.borrow_mut();
            if current
                .as_ref()
                .is_some_and(|app| Rc::ptr_eq(&app.state, &self.state))
            {
                *current = None;
            }
        });
        log::debug!("Application: '{}' disposed", self.app_name());
    }
}
