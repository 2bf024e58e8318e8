//! Launcher script and user guide text.
//!
//! Both documents depend only on which capabilities were bundled. Rendering
//! is pure; the packager decides where the text is written.
//!
//! ## Generated files
//!
//! - `Launch <title>.bat` - Windows launcher that starts the packaged exe
//! - `<title> User Guide.txt` - Plain-text usage guide

use crate::capability::{Capability, CapabilityReport};
use crate::config::AppNames;

pub fn launcher_file_name(app: &AppNames) -> String {
    format!("Launch {}.bat", app.title)
}

pub fn guide_file_name(app: &AppNames) -> String {
    format!("{} User Guide.txt", app.title)
}

/// Feature bullet points advertised by the launcher.
pub fn feature_list(report: &CapabilityReport) -> Vec<&'static str> {
    let selenium = report.has(Capability::Selenium);
    let playwright = report.has(Capability::Playwright);

    let mut features = Vec::new();
    match (selenium, playwright) {
        (true, true) => features.push("[+] Dual browser support (Selenium + Playwright)"),
        (true, false) => features.push("[+] Selenium browser control"),
        (false, true) => features.push("[+] Playwright browser control"),
        (false, false) => {}
    }

    if report.has(Capability::OpenAi) {
        features.push("[+] Automatic captcha recognition (GPT-4)");
    } else {
        features.push("[ ] Manual captcha entry");
    }

    features.push("[+] Simple installation");
    features.push("[+] Optimized ticket grabbing");
    features
}

pub fn render_launcher(report: &CapabilityReport, app: &AppNames) -> String {
    let features = feature_list(report)
        .iter()
        .map(|f| format!("echo     {}", f))
        .collect::<Vec<_>>()
        .join("\r\n");

    format!(
        "@echo off\r\n\
title {title}\r\n\
chcp 65001 >nul\r\n\
\r\n\
echo.\r\n\
echo                   {title} v1.0\r\n\
echo.\r\n\
echo     Features:\r\n\
{features}\r\n\
echo.\r\n\
echo     Getting started:\r\n\
echo     1. The program starts automatically\r\n\
echo     2. Enter your access code\r\n\
echo     3. Click \"Open browser and log in\"\r\n\
echo     4. Log in to your account in the browser\r\n\
echo     5. Return to the program and click \"Start\"\r\n\
echo.\r\n\
\r\n\
cd /d \"%~dp0{dir}\"\r\n\
start \"\" \"{exe}\"\r\n\
\r\n\
echo     Program started!\r\n\
timeout /t 3 >nul\r\n",
        title = app.title,
        features = features,
        dir = app.dir_name,
        exe = app.executable,
    )
}

pub fn render_guide(report: &CapabilityReport, app: &AppNames) -> String {
    let auto_captcha = report.has(Capability::OpenAi);
    let captcha_feature = if auto_captcha {
        "- Smart captcha: captchas are recognized automatically with GPT-4"
    } else {
        "- Manual captcha: captchas are typed in by you, nothing leaves your machine"
    };
    let captcha_troubleshooting = if auto_captcha {
        "GPT-4 mode: the program recognizes captchas automatically."
    } else {
        "Manual mode: type the captcha in the browser yourself."
    };

    format!(
        r#"{title} User Guide
{underline}

FEATURES
--------
{captcha_feature}
- Precise timing: optimized timing control and button detection
- Safety net: complete error handling and retries

QUICK START
-----------
System requirements:
- Windows 10 or Windows 11 (64-bit)
- Google Chrome
- A stable internet connection

Step 1: Start the program
  Double-click "{launcher}"

Step 2: Enter your access code
  Type the code you received into the program window

Step 3: Open the browser
  Click "Open browser and log in"

Step 4: Log in
  Log in to your ticketing account in the Chrome window that opens

Step 5: Start
  Return to the program and click "Start"

TIPS
----
1. Use a wired connection if you can
2. Close programs you do not need
3. Keep Chrome up to date
4. Log in 10-15 minutes before sales open

TROUBLESHOOTING
---------------
The program does not start:
- Make sure you are on 64-bit Windows 10/11
- Try running as administrator
- Temporarily disable antivirus software

The browser does not connect:
- Make sure Google Chrome is installed
- Make sure you clicked "Open browser and log in"
- Restart the program

Captcha problems:
{captcha_troubleshooting}
- Failed recognitions are retried automatically
- You can always finish the captcha in the browser by hand

PRIVACY
-------
- The program runs entirely on your computer
- No personal data is collected
- Only download the program from the official site
"#,
        title = app.title,
        underline = "=".repeat(app.title.chars().count() + " User Guide".len()),
        captcha_feature = captcha_feature,
        launcher = launcher_file_name(app),
        captcha_troubleshooting = captcha_troubleshooting,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> AppNames {
        AppNames {
            dir_name: "TixQuic_Grabber".into(),
            executable: "TixQuic_Grabber.exe".into(),
            title: "TixQuic Grabber".into(),
        }
    }

    #[test]
    fn test_dual_browser_feature() {
        let report = CapabilityReport::from_pairs(&[
            (Capability::Selenium, true),
            (Capability::Playwright, true),
        ]);
        let features = feature_list(&report);
        assert!(features[0].contains("Dual browser"));
        assert!(features.iter().any(|f| f.contains("Manual captcha")));
    }

    #[test]
    fn test_no_browser_feature_when_none_present() {
        let features = feature_list(&CapabilityReport::default());
        assert!(!features.iter().any(|f| f.contains("browser")));
    }

    #[test]
    fn test_launcher_starts_configured_exe() {
        let text = render_launcher(&CapabilityReport::default(), &app());
        assert!(text.starts_with("@echo off"));
        assert!(text.contains("cd /d \"%~dp0TixQuic_Grabber\""));
        assert!(text.contains("start \"\" \"TixQuic_Grabber.exe\""));
    }

    #[test]
    fn test_guide_follows_openai_presence() {
        let with = render_guide(
            &CapabilityReport::from_pairs(&[(Capability::OpenAi, true)]),
            &app(),
        );
        let without = render_guide(&CapabilityReport::default(), &app());
        assert!(with.contains("GPT-4 mode"));
        assert!(!with.contains("Manual mode"));
        assert!(without.contains("Manual mode"));
        assert!(without.contains("Launch TixQuic Grabber.bat"));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let report = CapabilityReport::from_pairs(&[(Capability::Selenium, true)]);
        assert_eq!(render_launcher(&report, &app()), render_launcher(&report, &app()));
        assert_eq!(render_guide(&report, &app()), render_guide(&report, &app()));
    }
}
