//! services/rotation_service.rs
//! Round-robin de credenciales y proxies. Los cursores son índices propios
//! de cada sesión; los pools viven aparte y nunca se mutan.

/// Aviso emitido cuando el cursor de credenciales avanza.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rotation {
    /// Posición 1-based dentro del pool, para mostrar `n/len`.
    pub position: usize,
    pub pool_len: usize,
    pub credential_index: usize,
}

#[derive(Debug, Clone)]
pub struct RotationScheduler {
    cadence: usize,
    credential_len: usize,
    proxy_len: usize,
    credential_cursor: usize,
    proxy_cursor: usize,
    consumed: usize,
}

impl RotationScheduler {
    /// `proxy_len == 0` significa proxies desactivados.
    pub fn new(cadence: usize, credential_len: usize, proxy_len: usize) -> Self {
        RotationScheduler {
            cadence: cadence.max(1),
            credential_len,
            proxy_len,
            credential_cursor: 0,
            proxy_cursor: 0,
            consumed: 0,
        }
    }

    pub fn credential_index(&self) -> usize {
        if self.credential_len == 0 {
            return 0;
        }
        self.credential_cursor % self.credential_len
    }

    pub fn proxy_index(&self) -> Option<usize> {
        if self.proxy_len == 0 {
            return None;
        }
        Some(self.proxy_cursor % self.proxy_len)
    }

    /// Cuenta un intento (exitoso o no). Tras `cadence` intentos avanzan
    /// ambos cursores; solo se devuelve aviso si hay más de una credencial.
    pub fn record_attempt(&mut self) -> Option<Rotation> {
        self.consumed += 1;
        if self.consumed < self.cadence {
            return None;
        }

        self.consumed = 0;
        self.credential_cursor += 1;
        if self.proxy_len > 0 {
            self.proxy_cursor += 1;
        }

        if self.credential_len > 1 {
            let idx = self.credential_index();
            Some(Rotation {
                position: idx + 1,
                pool_len: self.credential_len,
                credential_index: idx,
            })
        } else {
            None
        }
    }
}
