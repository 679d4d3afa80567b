// Dataset Query Service: one enrollment CSV, loaded at startup, queried read-only.
// The table is shared as Arc<Dataset>; nothing writes to it after load.

pub mod handlers;
pub mod query;
pub mod record;

pub use query::{Aggregate, Dimension, FilterOptions, Filters, Summary};
pub use record::Dataset;

#[cfg(test)]
pub mod test_support {
    use super::Dataset;

    /// Six rows; the DERECHO 2023 row has zero enrolled and is dropped on load.
    pub const SAMPLE_CSV: &str = "\
Institución de Educación Superior (IES),Programa Académico,Departamento de oferta del programa,Municipio de oferta del programa,Año,Id Género,Total Matriculados
UNIVERSIDAD NACIONAL,INGENIERIA DE SISTEMAS,BOGOTA D.C.,BOGOTA D.C.,2022,1,\"1,200\"
UNIVERSIDAD NACIONAL,INGENIERIA DE SISTEMAS,BOGOTA D.C.,BOGOTA D.C.,2022,2,450
UNIVERSIDAD DE ANTIOQUIA,MEDICINA,ANTIOQUIA,MEDELLIN,2022,2,300
UNIVERSIDAD DE ANTIOQUIA,MEDICINA,ANTIOQUIA,MEDELLIN,2023,1,280
UNIVERSIDAD DEL VALLE,DERECHO,VALLE DEL CAUCA,CALI,2023,2,0
UNIVERSIDAD DEL VALLE,DERECHO,VALLE DEL CAUCA,CALI,2021,1,95
";

    pub fn sample_dataset() -> Dataset {
        Dataset::from_reader(SAMPLE_CSV.as_bytes()).expect("sample CSV must parse")
    }
}
