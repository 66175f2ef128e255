use windows::Win32::UI::Shell::IsUserAnAdmin;

/// True when the process runs with administrator rights.
pub fn is_elevated() -> bool {
    unsafe { IsUserAnAdmin().as_bool() }
}
