// src/common/i18n.rs

use std::collections::HashMap;

pub const DEFAULT_LANG: &str = "es";

// (código, espanhol, inglês, português)
const MESSAGES: &[(&str, &str, &str, &str)] = &[
    ("VALIDATION_ERROR", "Uno o más campos son inválidos.", "One or more fields are invalid.", "Um ou mais campos são inválidos."),
    ("USERNAME_ALREADY_EXISTS", "El nombre de usuario ya existe.", "The username is already taken.", "Este nome de usuário já está em uso."),
    ("EMAIL_ALREADY_EXISTS", "El email ya está registrado.", "This e-mail is already in use.", "Este e-mail já está em uso."),
    ("INVALID_CREDENTIALS", "Usuario o contraseña incorrectos.", "Invalid username or password.", "Usuário ou senha inválidos."),
    ("USER_INACTIVE", "El usuario está inactivo.", "The user is inactive.", "O usuário está inativo."),
    ("INVALID_TOKEN", "Token de autenticación inválido o ausente.", "Missing or invalid authentication token.", "Token de autenticação inválido ou ausente."),
    ("USER_NOT_FOUND", "Usuario no encontrado.", "User not found.", "Usuário não encontrado."),
    ("ROLE_NOT_FOUND", "Rol no encontrado.", "Role not found.", "Cargo não encontrado."),
    ("PERMISSION_DENIED", "No tienes permisos para realizar esta acción.", "You are not allowed to perform this action.", "Você não tem permissão para realizar esta ação."),
    ("CANNOT_MODIFY_SELF", "No puedes realizar esta acción sobre tu propio usuario.", "You cannot perform this action on your own user.", "Você não pode realizar esta ação sobre o próprio usuário."),
    ("PRODUCT_NOT_FOUND", "Producto no encontrado.", "Product not found.", "Produto não encontrado."),
    ("PRODUCT_CODE_ALREADY_EXISTS", "Ya existe un producto con ese código.", "A product with this code already exists.", "Já existe um produto com este código."),
    ("BARCODE_ALREADY_EXISTS", "El código de barras ya existe.", "The barcode already exists.", "O código de barras já existe."),
    ("SKU_ALREADY_EXISTS", "El SKU ya existe.", "The SKU already exists.", "O SKU já existe."),
    ("INVALID_BARCODE", "Código de barras inválido.", "Invalid barcode.", "Código de barras inválido."),
    ("INSUFFICIENT_STOCK", "Stock insuficiente.", "Insufficient stock.", "Estoque insuficiente."),
    ("INVALID_QUANTITY", "La cantidad debe ser mayor a 0.", "Quantity must be greater than 0.", "A quantidade deve ser maior que 0."),
    ("UNKNOWN_BARCODE", "Código no registrado. Puede crear el producto.", "Unknown code. You can create the product.", "Código não cadastrado. Você pode criar o produto."),
    ("INVALID_QR_DATA", "No se pudo generar el código QR.", "Could not generate the QR code.", "Não foi possível gerar o QR code."),
    ("CLIENT_NOT_FOUND", "Cliente no encontrado.", "Client not found.", "Cliente não encontrado."),
    ("CLIENT_DOCUMENT_ALREADY_EXISTS", "Ya existe un cliente con ese documento.", "A client with this document already exists.", "Já existe um cliente com este documento."),
    ("SALE_NOT_FOUND", "Venta no encontrada.", "Sale not found.", "Venda não encontrada."),
    ("SALE_ALREADY_ANNULLED", "La venta ya está anulada.", "The sale is already annulled.", "A venda já está anulada."),
    ("EMPTY_DOCUMENT", "Debe agregar al menos un producto.", "At least one line is required.", "Adicione pelo menos uma linha."),
    ("DISCOUNT_EXCEEDS_TOTAL", "El descuento no puede superar el total.", "The discount cannot exceed the total.", "O desconto não pode superar o total."),
    ("PURCHASE_NOT_FOUND", "Compra no encontrada.", "Purchase not found.", "Compra não encontrada."),
    ("INVOICE_NUMBER_ALREADY_EXISTS", "El número de factura ya existe.", "The invoice number already exists.", "O número da fatura já existe."),
    ("INVALID_DOCUMENT_TYPE", "Tipo de archivo no permitido.", "File type not allowed.", "Tipo de arquivo não permitido."),
    ("DOCUMENT_NOT_FOUND", "Archivo no encontrado.", "File not found.", "Arquivo não encontrado."),
    ("ORDER_NOT_FOUND", "Orden no encontrada.", "Order not found.", "Ordem não encontrada."),
    ("ORDER_LOCKED", "La orden no puede modificarse en su estado actual.", "The order cannot be changed in its current status.", "A ordem não pode ser alterada no estado atual."),
    ("SUPPLIER_NOT_FOUND", "Proveedor no encontrado.", "Supplier not found.", "Fornecedor não encontrado."),
    ("NIT_ALREADY_EXISTS", "Ya existe un proveedor con ese NIT.", "A supplier with this NIT already exists.", "Já existe um fornecedor com este NIT."),
    ("PRICE_NOT_FOUND", "Precio no encontrado.", "Price not found.", "Preço não encontrado."),
    ("REFERENCE_NOT_FOUND", "El registro relacionado no existe.", "The referenced record does not exist.", "O registro relacionado não existe."),
    ("RECORD_IN_USE", "El registro está siendo usado por otros datos.", "The record is referenced by other data.", "O registro está em uso por outros dados."),
    ("INTERNAL_SERVER_ERROR", "Ocurrió un error inesperado.", "An unexpected error occurred.", "Ocorreu um erro inesperado."),
];

#[derive(Clone, Debug)]
pub struct I18nStore {
    // idioma -> (código -> mensagem)
    catalogs: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl I18nStore {
    pub fn new() -> Self {
        let mut catalogs: HashMap<&'static str, HashMap<&'static str, &'static str>> = HashMap::new();
        for &(code, es, en, pt) in MESSAGES {
            catalogs.entry("es").or_default().insert(code, es);
            catalogs.entry("en").or_default().insert(code, en);
            catalogs.entry("pt").or_default().insert(code, pt);
        }
        Self { catalogs }
    }

    /// Busca no idioma pedido, depois no padrão; em último caso devolve o próprio código.
    pub fn translate(&self, lang: &str, code: &str) -> String {
        [lang, DEFAULT_LANG]
            .iter()
            .find_map(|l| self.catalogs.get(*l).and_then(|c| c.get(code)))
            .map(|m| m.to_string())
            .unwrap_or_else(|| code.to_string())
    }
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_known_languages() {
        let store = I18nStore::new();
        assert_eq!(store.translate("en", "SALE_NOT_FOUND"), "Sale not found.");
        assert_eq!(store.translate("pt", "SALE_NOT_FOUND"), "Venda não encontrada.");
    }

    #[test]
    fn falls_back_to_spanish_then_code() {
        let store = I18nStore::new();
        assert_eq!(store.translate("fr", "SALE_NOT_FOUND"), "Venta no encontrada.");
        assert_eq!(store.translate("en", "SOMETHING_ELSE"), "SOMETHING_ELSE");
    }

    #[test]
    fn every_error_code_is_translated() {
        use crate::common::error::AppError;
        let store = I18nStore::new();
        let samples = [
            AppError::InvalidToken,
            AppError::OrderLocked,
            AppError::RecordInUse,
            AppError::ReferenceNotFound,
            AppError::InvalidBarcode("x".into()),
            AppError::FontNotFound("x".into()),
        ];
        for err in samples {
            assert_ne!(store.translate("en", err.code()), err.code());
        }
    }
}
