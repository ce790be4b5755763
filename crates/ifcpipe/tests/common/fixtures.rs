//! Builders for small, valid IFC exchange files.

#![allow(dead_code)]

/// Builder for the text of an IFC4 exchange file. Entity ids are assigned in
/// call order starting at 1.
pub struct IfcBuilder {
    file_name: String,
    originating_system: String,
    lines: Vec<String>,
}

impl IfcBuilder {
    pub fn new(file_name: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            originating_system: "Test Modeler 1.0".to_string(),
            lines: Vec::new(),
        }
    }

    pub fn originating_system(mut self, system: &str) -> Self {
        self.originating_system = system.to_string();
        self
    }

    fn push(&mut self, entity: String) -> u64 {
        let id = self.lines.len() as u64 + 1;
        self.lines.push(format!("#{}={};", id, entity));
        id
    }

    pub fn wall(&mut self, global_id: &str, name: &str) -> u64 {
        self.push(format!("IFCWALL('{}',$,'{}',$,$,$,$,$,$)", global_id, name))
    }

    pub fn door(&mut self, global_id: &str, name: &str) -> u64 {
        self.push(format!(
            "IFCDOOR('{}',$,'{}',$,$,$,$,$,$,$,$,$,$)",
            global_id, name
        ))
    }

    /// Any element entity, e.g. `IFCUNITARYEQUIPMENT`, with its optional
    /// trailing attributes unset.
    pub fn element(&mut self, entity: &str, global_id: &str, name: &str) -> u64 {
        self.push(format!(
            "{}('{}',$,'{}',$,$,$,$,$,$)",
            entity, global_id, name
        ))
    }

    pub fn opening(&mut self, global_id: &str) -> u64 {
        self.push(format!("IFCOPENINGELEMENT('{}',$,$,$,$,$,$,$,$)", global_id))
    }

    pub fn storey(&mut self, global_id: &str, name: &str) -> u64 {
        self.push(format!(
            "IFCBUILDINGSTOREY('{}',$,'{}',$,$,$,$,$,.ELEMENT.,0.)",
            global_id, name
        ))
    }

    pub fn building(&mut self, global_id: &str, name: &str) -> u64 {
        self.push(format!(
            "IFCBUILDING('{}',$,'{}',$,$,$,$,$,.ELEMENT.,$,$,$)",
            global_id, name
        ))
    }

    /// Attaches a property set with single-value properties. Each value is a
    /// STEP literal such as `IFCBOOLEAN(.T.)` or `IFCLABEL('Concrete')`.
    pub fn property_set(&mut self, objects: &[u64], name: &str, properties: &[(&str, &str)]) -> u64 {
        let property_ids: Vec<String> = properties
            .iter()
            .map(|(prop, value)| {
                let id = self.push(format!("IFCPROPERTYSINGLEVALUE('{}',$,{},$)", prop, value));
                format!("#{}", id)
            })
            .collect();
        let pset = self.push(format!(
            "IFCPROPERTYSET('pset-{}',$,'{}',$,({}))",
            self.lines.len() + 1,
            name,
            property_ids.join(",")
        ));
        let objects: Vec<String> = objects.iter().map(|id| format!("#{}", id)).collect();
        self.push(format!(
            "IFCRELDEFINESBYPROPERTIES('rdp-{}',$,$,$,({}),#{})",
            self.lines.len() + 1,
            objects.join(","),
            pset
        ))
    }

    pub fn contained_in(&mut self, elements: &[u64], structure: u64) -> u64 {
        let elements: Vec<String> = elements.iter().map(|id| format!("#{}", id)).collect();
        self.push(format!(
            "IFCRELCONTAINEDINSPATIALSTRUCTURE('rc-{}',$,$,$,({}),#{})",
            self.lines.len() + 1,
            elements.join(","),
            structure
        ))
    }

    pub fn aggregates(&mut self, whole: u64, parts: &[u64]) -> u64 {
        let parts: Vec<String> = parts.iter().map(|id| format!("#{}", id)).collect();
        self.push(format!(
            "IFCRELAGGREGATES('ra-{}',$,$,$,#{},({}))",
            self.lines.len() + 1,
            whole,
            parts.join(",")
        ))
    }

    pub fn voids(&mut self, element: u64, opening: u64) -> u64 {
        self.push(format!(
            "IFCRELVOIDSELEMENT('rv-{}',$,$,$,#{},#{})",
            self.lines.len() + 1,
            element,
            opening
        ))
    }

    pub fn fills(&mut self, opening: u64, element: u64) -> u64 {
        self.push(format!(
            "IFCRELFILLSELEMENT('rf-{}',$,$,$,#{},#{})",
            self.lines.len() + 1,
            opening,
            element
        ))
    }

    pub fn interferes(&mut self, relating: u64, related: u64) -> u64 {
        self.push(format!(
            "IFCRELINTERFERESELEMENTS('ri-{}',$,$,$,#{},#{},$,'HARD',.T.)",
            self.lines.len() + 1,
            relating,
            related
        ))
    }

    /// Appends a raw, possibly malformed, data line.
    pub fn raw(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    pub fn build(&self) -> String {
        format!(
            "ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('ViewDefinition [CoordinationView]'),'2;1');
FILE_NAME('{}','2024-05-01T12:00:00',('Author'),('Org'),'Preprocessor','{}','');
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
{}
ENDSEC;
END-ISO-10303-21;
",
            self.file_name,
            self.originating_system,
            self.lines.join("\n")
        )
    }
}

/// Two walls with three properties between them.
pub fn three_row_model(file_name: &str) -> String {
    let mut b = IfcBuilder::new(file_name);
    let w1 = b.wall("wall-1", "Wall A");
    let w2 = b.wall("wall-2", "Wall B");
    b.property_set(
        &[w1],
        "Pset_WallCommon",
        &[("IsExternal", "IFCBOOLEAN(.T.)"), ("FireRating", "IFCLABEL('REI60')")],
    );
    b.property_set(&[w2], "Pset_WallCommon", &[("Width", "IFCLENGTHMEASURE(0.25)")]);
    b.build()
}

/// One wall contained in one storey, no properties.
pub fn containment_model(file_name: &str) -> String {
    let mut b = IfcBuilder::new(file_name);
    let wall = b.wall("wall-1", "Wall A");
    let storey = b.storey("storey-1", "Level 1");
    b.contained_in(&[wall], storey);
    b.build()
}

/// A structurally valid file with no elements.
pub fn empty_model(file_name: &str) -> String {
    IfcBuilder::new(file_name).build()
}

/// A wall next to building-services equipment, all sharing one property set.
pub fn services_model(file_name: &str) -> String {
    let mut b = IfcBuilder::new(file_name);
    let wall = b.wall("wall-1", "Wall A");
    let ahu = b.element("IFCUNITARYEQUIPMENT", "ahu-1", "AHU-1");
    let damper = b.element("IFCDAMPER", "damper-1", "FD-1");
    let outlet = b.element("IFCOUTLET", "outlet-1", "Socket");
    let controller = b.element("IFCCONTROLLER", "ctrl-1", "BMS");
    b.property_set(
        &[wall, ahu, damper, outlet, controller],
        "Pset_Maintenance",
        &[("ServiceLife", "IFCINTEGER(25)")],
    );
    b.interferes(ahu, damper);
    b.build()
}

/// Header and data are well formed except for one instance whose
/// parameters are nested `depth` levels deep.
pub fn deeply_nested_model(file_name: &str, depth: usize) -> String {
    let mut b = IfcBuilder::new(file_name);
    let wall = b.wall("wall-1", "Wall A");
    b.property_set(&[wall], "Pset_WallCommon", &[("IsExternal", "IFCBOOLEAN(.T.)")]);
    b.raw(&format!("#900=IFCWALL({}", "(".repeat(depth)));
    b.build()
}
