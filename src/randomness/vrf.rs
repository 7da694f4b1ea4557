use crate::errors::RandomnessError;
use crate::roulette::RequestId;
use schnorrkel::{Keypair, PublicKey, SecretKey, Signature};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;

const VRF_SIGNING_CONTEXT: &[u8] = b"substrate";

/// VRF output with everything needed to verify it publicly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VrfBundle {
    pub vrf_output: String,
    pub vrf_proof: String,
    pub public_key: String,
    pub input_message: String,
}

/// VRF-based source of spin values
pub struct VrfRandomnessSource {
    keypair: Arc<Keypair>,
    domain: String,
}

impl VrfRandomnessSource {
    pub fn new(keypair: Keypair, domain: impl Into<String>) -> Self {
        Self {
            keypair: Arc::new(keypair),
            domain: domain.into(),
        }
    }

    /// Create a source with a random keypair
    pub fn new_random(domain: impl Into<String>) -> Self {
        use rand_core::OsRng;
        let keypair = Keypair::generate_with(OsRng);
        Self::new(keypair, domain)
    }

    /// Load a source from a hex-encoded 64-byte secret key
    pub fn from_secret_hex(secret_hex: &str, domain: impl Into<String>) -> Result<Self, RandomnessError> {
        let bytes = hex::decode(secret_hex)
            .map_err(|e| RandomnessError::Vrf(format!("Invalid secret key hex: {}", e)))?;
        let secret = SecretKey::from_bytes(&bytes)
            .map_err(|e| RandomnessError::Vrf(format!("Invalid secret key: {:?}", e)))?;
        Ok(Self::new(secret.to_keypair(), domain))
    }

    /// Message signed for a request
    pub fn input_message(&self, request_id: RequestId) -> String {
        format!("{}:spin:{}", self.domain, request_id)
    }

    /// Produce a verifiable bundle for a randomness request
    pub fn generate(&self, request_id: RequestId) -> Result<VrfBundle, RandomnessError> {
        let input_message = self.input_message(request_id);
        let (vrf_output, vrf_proof) = self.vrf_sign(input_message.as_bytes());

        Ok(VrfBundle {
            vrf_output: hex::encode(vrf_output),
            vrf_proof: hex::encode(vrf_proof),
            public_key: self.public_key_hex(),
            input_message,
        })
    }

    fn vrf_sign(&self, message: &[u8]) -> (Vec<u8>, Vec<u8>) {
        use schnorrkel::context::SigningContext;

        let ctx = SigningContext::new(VRF_SIGNING_CONTEXT);
        let signature = self.keypair.sign(ctx.bytes(message));

        // Output is the hash of the signature; the signature is the proof
        let mut hasher = Sha256::new();
        hasher.update(signature.to_bytes());
        let vrf_output = hasher.finalize().to_vec();

        (vrf_output, signature.to_bytes().to_vec())
    }

    /// Spin value from a bundle: the first 8 output bytes, big-endian
    pub fn random_value(bundle: &VrfBundle) -> Result<u64, RandomnessError> {
        let output = hex::decode(&bundle.vrf_output)
            .map_err(|e| RandomnessError::Vrf(format!("Invalid VRF output hex: {}", e)))?;
        let head: [u8; 8] = output
            .get(..8)
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| RandomnessError::Vrf("VRF output shorter than 8 bytes".to_string()))?;
        Ok(u64::from_be_bytes(head))
    }

    /// Verify a bundle against the message it claims to sign
    pub fn verify(bundle: &VrfBundle, expected_input: &str) -> Result<bool, RandomnessError> {
        if bundle.input_message != expected_input {
            return Ok(false);
        }

        let vrf_output = hex::decode(&bundle.vrf_output)
            .map_err(|e| RandomnessError::Vrf(format!("Invalid VRF output hex: {}", e)))?;
        let vrf_proof = hex::decode(&bundle.vrf_proof)
            .map_err(|e| RandomnessError::Vrf(format!("Invalid VRF proof hex: {}", e)))?;
        let public_key_bytes = hex::decode(&bundle.public_key)
            .map_err(|e| RandomnessError::Vrf(format!("Invalid public key hex: {}", e)))?;

        let public_key = PublicKey::from_bytes(&public_key_bytes)
            .map_err(|e| RandomnessError::Vrf(format!("Invalid public key: {:?}", e)))?;
        let signature_array: [u8; 64] = vrf_proof
            .try_into()
            .map_err(|_| RandomnessError::Vrf("Signature must be 64 bytes".to_string()))?;
        let signature = Signature::from_bytes(&signature_array)
            .map_err(|e| RandomnessError::Vrf(format!("Invalid signature: {:?}", e)))?;

        use schnorrkel::context::SigningContext;
        let ctx = SigningContext::new(VRF_SIGNING_CONTEXT);
        if public_key
            .verify(ctx.bytes(expected_input.as_bytes()), &signature)
            .is_err()
        {
            return Ok(false);
        }

        let mut hasher = Sha256::new();
        hasher.update(signature_array);
        Ok(hasher.finalize().as_slice() == vrf_output.as_slice())
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.keypair.public.to_bytes())
    }
}
