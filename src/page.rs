// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Informational page shown to whoever scans the car's code.

const PHONE_PLACEHOLDER: &str = "__OWNER_PHONE__";

const PAGE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Move my car</title>
<style>
* { box-sizing: border-box; margin: 0; padding: 0; }
:root { --primary: #4776E6; --secondary: #8E54E9; --text: #2c3e50; }
body {
  font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
  display: flex; align-items: center; justify-content: center;
  min-height: 100vh; padding: 20px; line-height: 1.6; color: var(--text);
  background: linear-gradient(135deg, var(--primary), var(--secondary));
}
.container {
  text-align: center; width: 100%; max-width: 450px; padding: 20px 30px;
  border-radius: 24px; background: rgba(255, 255, 255, 0.95);
  box-shadow: 0 10px 40px rgba(0, 0, 0, 0.1);
}
h1 { font-size: 32px; margin-bottom: 25px; }
.car-icon { font-size: 64px; margin-bottom: 20px; display: inline-block; }
p { margin: 20px 0; font-size: 12px; color: #546e7a; }
.button-group { display: flex; flex-direction: column; gap: 15px; }
button {
  width: 100%; padding: 16px 24px; font-size: 18px; font-weight: 600; color: #fff;
  border: none; border-radius: 16px; cursor: pointer;
}
button:disabled { opacity: 0.7; cursor: default; }
.notify-btn { background: linear-gradient(45deg, var(--primary), var(--secondary)); }
.call-btn { background: linear-gradient(45deg, #00b09b, #96c93d); }
.toast {
  position: fixed; top: 30%; left: 50%; transform: translate(-50%, -50%);
  background: rgba(0, 0, 0, 0.8); color: #fff; padding: 10px 24px;
  border-radius: 20px; font-size: 14px; opacity: 0; transition: opacity 0.3s;
}
.toast.show { opacity: 1; }
</style>
</head>
<body>
<div class="container">
  <div class="car-icon">&#128663;</div>
  <h1>Need me to move my car?</h1>
  <p>Sorry for blocking you. Send a notification or give me a call and I will come right away.</p>
  <div class="button-group">
    <button class="notify-btn" onclick="notifyOwner()">Notify the owner</button>
    <button class="call-btn" onclick="callOwner()">Call the owner &#128222;</button>
  </div>
</div>
<div id="toast" class="toast"></div>
<script>
const ownerPhone = __OWNER_PHONE__;
const notifyLabel = "Notify the owner";

async function notifyOwner() {
  const button = document.querySelector('.notify-btn');
  if (button.disabled) return;
  button.disabled = true;
  button.innerText = "Sending...";

  let countdown = 60;
  let timer = null;
  const reset = () => {
    if (timer) clearInterval(timer);
    button.innerText = notifyLabel;
    button.disabled = false;
  };
  const startCountdown = () => {
    button.innerText = notifyLabel + " (" + countdown + "s)";
    timer = setInterval(() => {
      countdown--;
      button.innerText = notifyLabel + " (" + countdown + "s)";
      if (countdown <= 0) reset();
    }, 1000);
  };

  try {
    const response = await fetch("/sendNotification", {
      method: "POST",
      headers: { "Content-Type": "application/json" },
      body: JSON.stringify({})
    });
    const data = await response.json();
    if (data.success) {
      showToast("Notification sent!");
      startCountdown();
    } else {
      showToast("Could not send the notification, please call instead.");
      console.error("notification failed:", data);
      reset();
    }
  } catch (error) {
    console.error("notification failed:", error);
    showToast("Could not send the notification, please call instead.");
    reset();
  }
}

function callOwner() {
  if (!ownerPhone) {
    showToast("Phone number not configured");
    return;
  }
  window.location.href = "tel:" + ownerPhone;
}

function showToast(message, duration = 5000) {
  const toast = document.getElementById('toast');
  toast.textContent = message;
  toast.classList.add('show');
  setTimeout(() => toast.classList.remove('show'), duration);
}
</script>
</body>
</html>
"##;

/// Render the page with the owner's phone number behind the call button.
pub fn render(owner_phone: &str) -> String {
    PAGE_TEMPLATE.replacen(PHONE_PLACEHOLDER, &script_string_literal(owner_phone), 1)
}

/// Encode `value` as a JS string literal that is safe inside `<script>`.
fn script_string_literal(value: &str) -> String {
    serde_json::Value::String(value.to_string())
        .to_string()
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}
