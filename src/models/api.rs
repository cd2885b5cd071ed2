use serde::{ Serialize, Deserialize };

/// Body of `POST /chat`. Missing fields deserialize as empty and are
/// rejected by the relay, so clients always get the same 400.
#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user_id: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ChatReply {
    pub reply: String,
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}
