use serde::{Deserialize, Serialize};

/// Purchase order row as returned by `pedido/ListaSelAll`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pedido {
    pub id_pedido: i64,
    pub folio: String,
    pub id_tipo_documento: Option<i64>,
    pub id_proveedor: i64,
    pub fecha_pedido: String,
    pub numero_contrato: String,
    pub destinatario_factura: String,
    pub tiempo_entrega: String,
    pub id_usuario_elaboro: Option<i64>,
    pub id_usuario_autorizo: Option<i64>,
    pub iniciales_responsables: Option<String>,
    pub id_estatus_pedido: Option<i64>,
    pub id_procedimiento: Option<i64>,
    pub id_fuente_financiamiento_federal: Option<i64>,
    pub observaciones_generales: Option<String>,
    pub subtotal: f64,
    pub iva_total: Option<f64>,
    pub retenciones_total: Option<f64>,
    pub total_general: Option<f64>,
    pub fecha_registro: String,
    pub id_usuario_registro: i64,
    pub id_firma_elaboro: Option<i64>,
    pub id_firma_autorizo: Option<i64>,
    #[serde(rename = "id_proveedor_cat_proveedor")]
    pub proveedor: Proveedor,
    #[serde(rename = "id_usuario_registro_Spartan_User")]
    pub usuario_registro: SpartanUser,
}

/// Supplier joined from `cat_proveedor`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proveedor {
    pub id_proveedor: i64,
    pub razon_social: String,
    pub nombre_comercial: Option<String>,
    pub rfc: Option<String>,
    pub email: Option<String>,
    pub telefono: Option<String>,
    pub activo: Option<bool>,
}

/// Registering user joined from `Spartan_User`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpartanUser {
    #[serde(rename = "Id_User")]
    pub id_user: i64,
    pub name: String,
    pub role: Option<String>,
    pub image: Option<String>,
    pub email: Option<String>,
    pub status: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PedidosResponse {
    pub pedidos: Vec<Pedido>,
    #[serde(rename = "RowCount")]
    pub row_count: i64,
}

impl PedidosResponse {
    pub fn len(&self) -> usize {
        self.pedidos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pedidos.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::{json, Value};

    pub(crate) fn pedido_json(id: i64) -> Value {
        json!({
            "id_pedido": id,
            "folio": format!("PED-{id:04}"),
            "id_tipo_documento": null,
            "id_proveedor": 7,
            "fecha_pedido": "2024-03-01T00:00:00",
            "numero_contrato": "CAASIM-LP-001",
            "destinatario_factura": "CAASIM",
            "tiempo_entrega": "15 dias",
            "id_usuario_elaboro": 3,
            "id_usuario_autorizo": null,
            "iniciales_responsables": "JLP",
            "id_estatus_pedido": 1,
            "id_procedimiento": null,
            "id_fuente_financiamiento_federal": null,
            "observaciones_generales": null,
            "subtotal": 1000.5,
            "iva_total": 160.08,
            "retenciones_total": null,
            "total_general": 1160.58,
            "fecha_registro": "2024-03-01T10:15:00",
            "id_usuario_registro": 3,
            "id_firma_elaboro": null,
            "id_firma_autorizo": null,
            "id_proveedor_cat_proveedor": {
                "id_proveedor": 7,
                "razon_social": "Materiales del Centro SA de CV",
                "nombre_comercial": null,
                "rfc": "MCE010101AAA",
                "email": null,
                "telefono": null,
                "activo": true
            },
            "id_usuario_registro_Spartan_User": {
                "Id_User": 3,
                "Name": "Jorge",
                "Role": "admin",
                "Image": null,
                "Email": "jorge@example.com",
                "Status": null,
                "Username": "jorge",
                "Password": null
            }
        })
    }

    #[test]
    fn test_parse_listing() {
        let body = json!({"pedidos": [pedido_json(1), pedido_json(2)], "RowCount": 40});
        let page: PedidosResponse = serde_json::from_value(body).unwrap();

        assert_eq!(page.len(), 2);
        assert_eq!(page.row_count, 40);

        let first = &page.pedidos[0];
        assert_eq!(first.folio, "PED-0001");
        assert_eq!(first.id_tipo_documento, None);
        assert_eq!(first.iva_total, Some(160.08));
        assert_eq!(first.proveedor.razon_social, "Materiales del Centro SA de CV");
        assert_eq!(first.proveedor.activo, Some(true));
        assert_eq!(first.usuario_registro.id_user, 3);
        assert_eq!(first.usuario_registro.username.as_deref(), Some("jorge"));
    }

    #[test]
    fn test_serializes_remote_field_names() {
        let pedido: Pedido = serde_json::from_value(pedido_json(9)).unwrap();
        let value = serde_json::to_value(&pedido).unwrap();
        assert!(value.get("id_proveedor_cat_proveedor").is_some());
        assert_eq!(value["id_usuario_registro_Spartan_User"]["Id_User"], 3);
    }

    #[test]
    fn test_empty_page() {
        let page: PedidosResponse =
            serde_json::from_value(json!({"pedidos": [], "RowCount": 0})).unwrap();
        assert!(page.is_empty());
    }
}
