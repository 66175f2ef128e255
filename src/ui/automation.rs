//! UI Automation backend for the window-tree seams.
//!
//! COM must be initialised on the calling thread (see
//! [`crate::platform::ComGuard`]) before creating a [`UiaDesktop`].

use super::element::{Desktop, DeviceTree, Dialog, TitlePattern, TreeEntry, UiError, WindowId};
use windows::Win32::System::Com::{CoCreateInstance, CLSCTX_INPROC_SERVER};
use windows::Win32::UI::Accessibility::{
    CUIAutomation, IUIAutomation, IUIAutomationCondition, IUIAutomationElement,
    IUIAutomationInvokePattern, IUIAutomationSelectionItemPattern, TreeScope,
    TreeScope_Children, TreeScope_Descendants, UIA_ButtonControlTypeId, UIA_InvokePatternId,
    UIA_SelectionItemPatternId, UIA_TreeControlTypeId, UIA_CONTROLTYPE_ID,
};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, INPUT_MOUSE, KEYBDINPUT, KEYBD_EVENT_FLAGS,
    KEYEVENTF_KEYUP, MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP, MOUSEINPUT, MOUSE_EVENT_FLAGS,
    VK_SPACE,
};
use windows::Win32::UI::WindowsAndMessaging::SetCursorPos;

fn query_error(err: windows::core::Error) -> UiError {
    UiError::Query(err.to_string())
}

fn element_name(element: &IUIAutomationElement) -> String {
    unsafe { element.CurrentName() }
        .map(|name| name.to_string())
        .unwrap_or_default()
}

fn is_control(element: &IUIAutomationElement, control: UIA_CONTROLTYPE_ID) -> bool {
    unsafe { element.CurrentControlType() }
        .map(|kind| kind == control)
        .unwrap_or(false)
}

/// Shared automation client plus the match-everything condition.
#[derive(Clone)]
struct Uia {
    automation: IUIAutomation,
    everything: IUIAutomationCondition,
}

impl Uia {
    fn find_all(
        &self,
        element: &IUIAutomationElement,
        scope: TreeScope,
    ) -> Result<Vec<IUIAutomationElement>, UiError> {
        unsafe {
            let array = element
                .FindAll(scope, &self.everything)
                .map_err(query_error)?;
            let len = array.Length().map_err(query_error)?;
            (0..len)
                .map(|i| array.GetElement(i).map_err(query_error))
                .collect()
        }
    }
}

/// Desktop backed by the system UI Automation tree.
pub struct UiaDesktop {
    uia: Uia,
}

impl UiaDesktop {
    pub fn new() -> Result<Self, UiError> {
        unsafe {
            let automation: IUIAutomation =
                CoCreateInstance(&CUIAutomation, None, CLSCTX_INPROC_SERVER)
                    .map_err(|e| UiError::Unavailable(e.to_string()))?;
            let everything = automation
                .CreateTrueCondition()
                .map_err(|e| UiError::Unavailable(e.to_string()))?;

            Ok(Self {
                uia: Uia {
                    automation,
                    everything,
                },
            })
        }
    }
}

impl Desktop for UiaDesktop {
    fn find_windows(&self, pattern: &TitlePattern) -> Result<Vec<Box<dyn Dialog>>, UiError> {
        let root = unsafe { self.uia.automation.GetRootElement() }.map_err(query_error)?;
        let windows = self.uia.find_all(&root, TreeScope_Children)?;

        Ok(windows
            .into_iter()
            .filter_map(|element| {
                let title = element_name(&element);
                if !pattern.matches(&title) {
                    return None;
                }
                let hwnd = unsafe { element.CurrentNativeWindowHandle() }.ok()?;
                Some(Box::new(UiaDialog {
                    uia: self.uia.clone(),
                    element,
                    title,
                    id: WindowId(hwnd.0 as isize),
                }) as Box<dyn Dialog>)
            })
            .collect())
    }
}

struct UiaDialog {
    uia: Uia,
    element: IUIAutomationElement,
    title: String,
    id: WindowId,
}

impl Dialog for UiaDialog {
    fn id(&self) -> WindowId {
        self.id
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn device_tree(&self) -> Result<Option<Box<dyn DeviceTree>>, UiError> {
        let tree = self
            .uia
            .find_all(&self.element, TreeScope_Descendants)?
            .into_iter()
            .find(|element| is_control(element, UIA_TreeControlTypeId));

        Ok(tree.map(|element| {
            Box::new(UiaTree {
                uia: self.uia.clone(),
                element,
            }) as Box<dyn DeviceTree>
        }))
    }

    fn press_button(&self, name: &str) -> Result<(), UiError> {
        let button = self
            .uia
            .find_all(&self.element, TreeScope_Descendants)?
            .into_iter()
            .find(|element| is_control(element, UIA_ButtonControlTypeId) && element_name(element) == name)
            .ok_or_else(|| UiError::ButtonNotFound {
                name: name.to_string(),
                window: self.title.clone(),
            })?;

        unsafe {
            let invoke: IUIAutomationInvokePattern = button
                .GetCurrentPatternAs(UIA_InvokePatternId)
                .map_err(|e| action_error(name, "invoke", e))?;
            invoke.Invoke().map_err(|e| action_error(name, "invoke", e))
        }
    }
}

struct UiaTree {
    uia: Uia,
    element: IUIAutomationElement,
}

impl DeviceTree for UiaTree {
    fn entries(&self) -> Result<Vec<Box<dyn TreeEntry>>, UiError> {
        Ok(self
            .uia
            .find_all(&self.element, TreeScope_Children)?
            .into_iter()
            .map(|element| {
                Box::new(UiaEntry {
                    uia: self.uia.clone(),
                    label: element_name(&element),
                    element,
                }) as Box<dyn TreeEntry>
            })
            .collect())
    }
}

struct UiaEntry {
    uia: Uia,
    element: IUIAutomationElement,
    label: String,
}

fn action_error(label: &str, action: &'static str, err: windows::core::Error) -> UiError {
    UiError::ActionFailed {
        label: label.to_string(),
        action,
        reason: err.to_string(),
    }
}

fn mouse_input(flags: MOUSE_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_MOUSE,
        Anonymous: INPUT_0 {
            mi: MOUSEINPUT {
                dwFlags: flags,
                ..Default::default()
            },
        },
    }
}

fn space_input(flags: KEYBD_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VK_SPACE,
                dwFlags: flags,
                ..Default::default()
            },
        },
    }
}

fn send_inputs(inputs: &[INPUT]) -> Result<(), windows::core::Error> {
    let sent = unsafe { SendInput(inputs, std::mem::size_of::<INPUT>() as i32) };
    if sent as usize == inputs.len() {
        Ok(())
    } else {
        Err(windows::core::Error::from_win32())
    }
}

impl UiaEntry {
    fn left_click(&self, times: usize, action: &'static str) -> Result<(), UiError> {
        let rect = unsafe { self.element.CurrentBoundingRectangle() }
            .map_err(|e| action_error(&self.label, action, e))?;
        let x = (rect.left + rect.right) / 2;
        let y = (rect.top + rect.bottom) / 2;

        unsafe { SetCursorPos(x, y) }.map_err(|e| action_error(&self.label, action, e))?;

        let mut inputs = Vec::with_capacity(times * 2);
        for _ in 0..times {
            inputs.push(mouse_input(MOUSEEVENTF_LEFTDOWN));
            inputs.push(mouse_input(MOUSEEVENTF_LEFTUP));
        }
        send_inputs(&inputs).map_err(|e| action_error(&self.label, action, e))
    }
}

impl TreeEntry for UiaEntry {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn cells(&self) -> Vec<String> {
        self.uia
            .find_all(&self.element, TreeScope_Children)
            .map(|children| children.iter().map(element_name).collect())
            .unwrap_or_default()
    }

    fn select(&self) -> Result<(), UiError> {
        unsafe {
            match self
                .element
                .GetCurrentPatternAs::<IUIAutomationSelectionItemPattern>(UIA_SelectionItemPatternId)
            {
                Ok(pattern) => pattern
                    .Select()
                    .map_err(|e| action_error(&self.label, "select", e)),
                // Not every row is selectable; focusing brings it into view.
                Err(_) => self
                    .element
                    .SetFocus()
                    .map_err(|e| action_error(&self.label, "select", e)),
            }
        }
    }

    fn click(&self) -> Result<(), UiError> {
        self.left_click(1, "click")
    }

    fn double_click(&self) -> Result<(), UiError> {
        self.left_click(2, "double-click")
    }

    fn press_space(&self) -> Result<(), UiError> {
        unsafe { self.element.SetFocus() }.map_err(|e| action_error(&self.label, "focus", e))?;
        send_inputs(&[
            space_input(KEYBD_EVENT_FLAGS::default()),
            space_input(KEYEVENTF_KEYUP),
        ])
        .map_err(|e| action_error(&self.label, "space", e))
    }
}
